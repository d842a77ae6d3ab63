//! # roadhub-supervisor
//!
//! The timeout and escalation supervisors: independent periodic sweeps that
//! re-derive "is this job overdue" purely from persisted timestamps. The
//! in-process acceptance timers in `roadhub-dispatch` are a latency
//! optimization; these sweeps are the correctness net that survives
//! restarts.

pub mod scheduler;
pub mod sweeps;

pub use scheduler::SupervisorScheduler;
