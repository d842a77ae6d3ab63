//! The individual supervisor sweeps.
//!
//! Every sweep is idempotent, safe under at-least-once invocation, guarded
//! against overlapping runs of itself, and isolates per-job failures so one
//! bad record never aborts the rest of a pass.

pub mod reminder;
pub mod stale_queue;
pub mod unassigned;

pub use reminder::ReminderSweep;
pub use stale_queue::StaleQueueSweep;
pub use unassigned::UnassignedJobMonitor;
