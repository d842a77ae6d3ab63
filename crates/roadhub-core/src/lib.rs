//! # roadhub-core
//!
//! Core crate for the RoadHub dispatch engine. Contains configuration
//! schemas, typed identifiers, geo primitives, and the unified error system.
//!
//! This crate has **no** internal dependencies on other RoadHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
