//! Domain events pushed through the real-time fan-out layer.
//!
//! Events are published into one or more rooms; each room type is an
//! independent namespace, so a cross-room event (a reassignment visible to
//! both contractors) is published once into each relevant room.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use roadhub_core::types::id::{ContractorId, JobId, RouteId};

use crate::job::status::{AssignmentMethod, JobStatus};

/// A named real-time subscription group.
///
/// The string form (`"tracking:{id}"` etc.) is the wire-level room name
/// clients subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomKey {
    /// Customer-facing live job tracking, keyed by job.
    Tracking(JobId),
    /// A contractor's personal queue feed.
    Queue(ContractorId),
    /// Candidate contractors watching an open job.
    Bidding(JobId),
    /// Shared contractor/customer route view.
    Route(RouteId),
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tracking(id) => write!(f, "tracking:{id}"),
            Self::Queue(id) => write!(f, "queue:{id}"),
            Self::Bidding(id) => write!(f, "bidding:{id}"),
            Self::Route(id) => write!(f, "route:{id}"),
        }
    }
}

impl std::str::FromStr for RoomKey {
    type Err = ();

    /// Parse the wire-level room name clients subscribe with.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s.split_once(':').ok_or(())?;
        match kind {
            "tracking" => id.parse().map(Self::Tracking).map_err(|_| ()),
            "queue" => id.parse().map(Self::Queue).map_err(|_| ()),
            "bidding" => id.parse().map(Self::Bidding).map_err(|_| ()),
            "route" => id.parse().map(Self::Route).map_err(|_| ()),
            _ => Err(()),
        }
    }
}

/// State-change events fanned out to interested rooms and users.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// A job moved to a new lifecycle status.
    StatusChanged {
        /// The job.
        job_id: JobId,
        /// The new status.
        status: JobStatus,
        /// The assigned contractor after the change, if any.
        contractor_id: Option<ContractorId>,
        /// When the change happened.
        timestamp: DateTime<Utc>,
    },
    /// A contractor was assigned to a job.
    Assigned {
        /// The job.
        job_id: JobId,
        /// The chosen contractor.
        contractor_id: ContractorId,
        /// How the contractor was chosen.
        method: AssignmentMethod,
        /// Assignment attempt count after this assignment.
        attempts: i32,
        /// When the assignment was made.
        timestamp: DateTime<Utc>,
    },
    /// A job moved from one contractor to another.
    Reassigned {
        /// The job.
        job_id: JobId,
        /// The vacated contractor, if one was set.
        from_contractor: Option<ContractorId>,
        /// The newly assigned contractor.
        to_contractor: ContractorId,
        /// Attempt count after the reassignment.
        attempts: i32,
        /// When the reassignment was made.
        timestamp: DateTime<Utc>,
    },
    /// A job gave up its assignment and went back to the unassigned pool.
    RevertedToUnassigned {
        /// The job.
        job_id: JobId,
        /// When the revert happened.
        timestamp: DateTime<Utc>,
    },
    /// A queued job's position or start estimate changed.
    QueuePosition {
        /// The job.
        job_id: JobId,
        /// The queue owner.
        contractor_id: ContractorId,
        /// New 1-based position (0 = current).
        position: i32,
        /// New estimated start time, if computed.
        estimated_start_at: Option<DateTime<Utc>>,
        /// When the change happened.
        timestamp: DateTime<Utc>,
    },
    /// A contractor's queue advanced after completion or cancellation.
    QueueAdvanced {
        /// The queue owner.
        contractor_id: ContractorId,
        /// The job promoted to current, if the queue was non-empty.
        promoted_job_id: Option<JobId>,
        /// When the queue advanced.
        timestamp: DateTime<Utc>,
    },
}

impl JobEvent {
    /// Event timestamp, regardless of variant.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::StatusChanged { timestamp, .. }
            | Self::Assigned { timestamp, .. }
            | Self::Reassigned { timestamp, .. }
            | Self::RevertedToUnassigned { timestamp, .. }
            | Self::QueuePosition { timestamp, .. }
            | Self::QueueAdvanced { timestamp, .. } => *timestamp,
        }
    }
}
