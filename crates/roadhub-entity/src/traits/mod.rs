//! Collaborator traits consumed by the dispatch engine.
//!
//! Each trait is the narrow interface to one external collaborator. The
//! concrete implementations live in `roadhub-database` (stores, directory),
//! `roadhub-notify` (sender), `roadhub-realtime` (channel), and
//! `roadhub-dispatch` (scoring client); tests substitute in-memory fakes.

pub mod channel;
pub mod directory;
pub mod notifier;
pub mod scoring;
pub mod store;

pub use channel::RealtimeChannel;
pub use directory::ContractorDirectory;
pub use notifier::{NotificationSender, TemplateKey};
pub use scoring::{AssignmentScore, ScoringStrategy};
pub use store::{JobStore, QueueStore};
