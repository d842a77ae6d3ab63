//! Job status and assignment method enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a service job.
///
/// The happy path is `new → assigned → accepted → en_route → on_site →
/// completed`. Reassignment loops a job back through `assigned` with a new
/// contractor; `cancelled` and `expired` are reachable from any non-terminal
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, waiting for a contractor to be selected.
    New,
    /// A contractor has been selected and is expected to accept.
    Assigned,
    /// The assigned contractor accepted the job.
    Accepted,
    /// The contractor is driving to the job location.
    EnRoute,
    /// The contractor has arrived on site.
    OnSite,
    /// Work finished.
    Completed,
    /// Cancelled by the customer or an admin.
    Cancelled,
    /// Timed out of the dispatch pipeline entirely.
    Expired,
}

impl JobStatus {
    /// Check if the job is in a terminal state. Terminal jobs are immutable.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }

    /// Check whether a transition from `self` to `next` is legal.
    ///
    /// `Assigned → Assigned` is the reassignment loop (new contractor, same
    /// status) and `Assigned → New` is the revert when no online candidate
    /// exists. Every non-terminal state may branch to `Cancelled`/`Expired`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(next, Self::Cancelled | Self::Expired) {
            return true;
        }
        matches!(
            (self, next),
            (Self::New, Self::Assigned)
                | (Self::Assigned, Self::Assigned)
                | (Self::Assigned, Self::New)
                | (Self::Assigned, Self::Accepted)
                | (Self::Accepted, Self::EnRoute)
                | (Self::EnRoute, Self::OnSite)
                | (Self::OnSite, Self::Completed)
        )
    }

    /// Statuses that count against a contractor's daily job cap.
    pub fn counts_toward_daily_cap(&self) -> bool {
        matches!(
            self,
            Self::Assigned | Self::EnRoute | Self::OnSite | Self::Completed
        )
    }

    /// Return the status as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Assigned => "assigned",
            Self::Accepted => "accepted",
            Self::EnRoute => "en_route",
            Self::OnSite => "on_site",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a job's contractor was chosen. Informational only: recorded for
/// analytics, never read back by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "assignment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMethod {
    /// Chosen by the AI scoring strategy.
    AiDispatch,
    /// Chosen by the proximity/round-robin fallback.
    RoundRobin,
    /// Assigned by hand through admin tooling.
    Manual,
}

impl AssignmentMethod {
    /// Return the method as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiDispatch => "ai_dispatch",
            Self::RoundRobin => "round_robin",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for AssignmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            JobStatus::New,
            JobStatus::Assigned,
            JobStatus::Accepted,
            JobStatus::EnRoute,
            JobStatus::OnSite,
            JobStatus::Completed,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_reassignment_loop_and_revert() {
        assert!(JobStatus::Assigned.can_transition_to(JobStatus::Assigned));
        assert!(JobStatus::Assigned.can_transition_to(JobStatus::New));
        assert!(!JobStatus::Accepted.can_transition_to(JobStatus::New));
    }

    #[test]
    fn test_terminal_states_are_frozen() {
        for terminal in [
            JobStatus::Completed,
            JobStatus::Cancelled,
            JobStatus::Expired,
        ] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(JobStatus::New));
            assert!(!terminal.can_transition_to(JobStatus::Cancelled));
        }
    }

    #[test]
    fn test_cancel_reachable_from_any_non_terminal() {
        for status in [
            JobStatus::New,
            JobStatus::Assigned,
            JobStatus::Accepted,
            JobStatus::EnRoute,
            JobStatus::OnSite,
        ] {
            assert!(status.can_transition_to(JobStatus::Cancelled));
            assert!(status.can_transition_to(JobStatus::Expired));
        }
    }

    #[test]
    fn test_daily_cap_statuses() {
        assert!(JobStatus::Assigned.counts_toward_daily_cap());
        assert!(JobStatus::Completed.counts_toward_daily_cap());
        assert!(!JobStatus::Accepted.counts_toward_daily_cap());
        assert!(!JobStatus::New.counts_toward_daily_cap());
        assert!(!JobStatus::Cancelled.counts_toward_daily_cap());
    }
}
