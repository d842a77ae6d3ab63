//! Queue entry status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one job's position in a contractor's personal queue.
///
/// Transitions only move forward: `queued → current → completed`, or
/// `queued`/`current` → `expired`/`reassigned`. Terminal entries are never
/// mutated again. `assigned` is accepted from older records and normalized
/// to `queued` at the store boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "queue_entry_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QueueEntryStatus {
    /// Waiting behind the contractor's current job.
    Queued,
    /// The contractor's single active job.
    Current,
    /// Legacy initial status; treated as `queued`.
    Assigned,
    /// The underlying job finished.
    Completed,
    /// Timed out of the queue without progress.
    Expired,
    /// Moved to a different contractor's queue.
    Reassigned,
}

impl QueueEntryStatus {
    /// Check if the entry is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Expired | Self::Reassigned)
    }

    /// Check if the entry still occupies a position in the queue.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Current | Self::Assigned)
    }

    /// Check whether a transition from `self` to `next` is legal
    /// (forward-only).
    pub fn can_transition_to(&self, next: QueueEntryStatus) -> bool {
        match self {
            Self::Queued | Self::Assigned => matches!(
                next,
                Self::Current | Self::Expired | Self::Reassigned
            ),
            Self::Current => matches!(
                next,
                Self::Completed | Self::Expired | Self::Reassigned
            ),
            Self::Completed | Self::Expired | Self::Reassigned => false,
        }
    }

    /// Return the status as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Current => "current",
            Self::Assigned => "assigned",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Reassigned => "reassigned",
        }
    }
}

impl fmt::Display for QueueEntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only() {
        assert!(QueueEntryStatus::Queued.can_transition_to(QueueEntryStatus::Current));
        assert!(QueueEntryStatus::Current.can_transition_to(QueueEntryStatus::Completed));
        // Never backward.
        assert!(!QueueEntryStatus::Current.can_transition_to(QueueEntryStatus::Queued));
        assert!(!QueueEntryStatus::Completed.can_transition_to(QueueEntryStatus::Current));
    }

    #[test]
    fn test_eviction_paths() {
        for from in [QueueEntryStatus::Queued, QueueEntryStatus::Current] {
            assert!(from.can_transition_to(QueueEntryStatus::Expired));
            assert!(from.can_transition_to(QueueEntryStatus::Reassigned));
        }
        // Queued entries complete only after becoming current.
        assert!(!QueueEntryStatus::Queued.can_transition_to(QueueEntryStatus::Completed));
    }

    #[test]
    fn test_terminal_entries_frozen() {
        for terminal in [
            QueueEntryStatus::Completed,
            QueueEntryStatus::Expired,
            QueueEntryStatus::Reassigned,
        ] {
            assert!(terminal.is_terminal());
            assert!(!terminal.is_active());
            assert!(!terminal.can_transition_to(QueueEntryStatus::Current));
        }
    }
}
