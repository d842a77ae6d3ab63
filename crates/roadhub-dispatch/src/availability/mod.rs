//! Contractor availability evaluation.
//!
//! The evaluator itself ([`evaluator::evaluate`]) is a pure predicate over
//! an [`snapshot::AvailabilitySnapshot`]; all I/O lives in the snapshot
//! builder so the decision logic stays deterministic and directly testable.

pub mod evaluator;
pub mod snapshot;

pub use evaluator::{evaluate, UnavailableReason};
pub use snapshot::{AvailabilityService, AvailabilitySnapshot};
