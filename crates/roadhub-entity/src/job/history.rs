//! Job status history entries (audit trail).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use roadhub_core::types::id::{ContractorId, JobId};

use super::status::JobStatus;

/// One row of a job's status audit trail, appended on every transition.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobStatusHistory {
    /// Unique history entry identifier.
    pub id: Uuid,
    /// The job this entry belongs to.
    pub job_id: JobId,
    /// Status before the transition. `None` for the creation entry.
    pub from_status: Option<JobStatus>,
    /// Status after the transition.
    pub to_status: JobStatus,
    /// Contractor involved in the transition, if any.
    pub contractor_id: Option<ContractorId>,
    /// Free-text context (e.g., the escalation that drove the change).
    pub note: Option<String>,
    /// When the transition happened.
    pub changed_at: DateTime<Utc>,
}

impl JobStatusHistory {
    /// Create a history entry for a transition happening now.
    pub fn transition(
        job_id: JobId,
        from_status: Option<JobStatus>,
        to_status: JobStatus,
        contractor_id: Option<ContractorId>,
        note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            from_status,
            to_status,
            contractor_id,
            note,
            changed_at: Utc::now(),
        }
    }
}
