//! # roadhub-entity
//!
//! Domain entity models for the RoadHub dispatch engine. Every struct in
//! this crate represents a database table row or a domain value object.
//! All entities derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and
//! database entities additionally derive `sqlx::FromRow`.
//!
//! The crate also hosts the engine's collaborator traits ([`traits`]) and
//! the domain events pushed through the real-time layer ([`events`]): both
//! traffic in entity types, so they live beside the models rather than in
//! `roadhub-core`.

pub mod contractor;
pub mod events;
pub mod job;
pub mod queue;
pub mod traits;
