//! Job query filters and update patches for the job store.

use chrono::{DateTime, Utc};

use roadhub_core::types::id::ContractorId;

use super::status::{AssignmentMethod, JobStatus};

/// Filter for `find_jobs` store queries. Empty fields are unconstrained.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    /// Match any of these statuses. Empty means all statuses.
    pub statuses: Vec<JobStatus>,
    /// Match jobs assigned to this contractor.
    pub contractor_id: Option<ContractorId>,
    /// Match jobs created strictly before this time.
    pub created_before: Option<DateTime<Utc>>,
    /// Match jobs created at or after this time.
    pub created_after: Option<DateTime<Utc>>,
    /// Match jobs assigned strictly before this time.
    pub assigned_before: Option<DateTime<Utc>>,
    /// Match jobs assigned at or after this time.
    pub assigned_after: Option<DateTime<Utc>>,
    /// Maximum number of rows to return (ordered oldest first).
    pub limit: Option<i64>,
}

impl JobFilter {
    /// Filter on a single status.
    pub fn with_status(status: JobStatus) -> Self {
        Self {
            statuses: vec![status],
            ..Self::default()
        }
    }

    /// Restrict to jobs created before the given time.
    pub fn created_before(mut self, at: DateTime<Utc>) -> Self {
        self.created_before = Some(at);
        self
    }

    /// Restrict to jobs assigned within `[after, before)`.
    pub fn assigned_between(mut self, after: DateTime<Utc>, before: DateTime<Utc>) -> Self {
        self.assigned_after = Some(after);
        self.assigned_before = Some(before);
        self
    }

    /// Restrict to a single contractor.
    pub fn for_contractor(mut self, contractor_id: ContractorId) -> Self {
        self.contractor_id = Some(contractor_id);
        self
    }
}

/// Partial update applied to a job record in one atomic write.
///
/// Nullable columns use a double `Option`: the outer level is "touch this
/// column at all", the inner level is the new value (so `Some(None)` clears
/// the column). `increment_attempts` is expressed as a flag rather than a
/// value so the store can bump the counter server-side, keeping it monotonic
/// under concurrent reassignments.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    /// New status, set together with its timestamp in the same write.
    pub status: Option<JobStatus>,
    /// Contractor assignment change.
    pub contractor_id: Option<Option<ContractorId>>,
    /// Assignment timestamp change.
    pub assigned_at: Option<Option<DateTime<Utc>>>,
    /// Acceptance timestamp.
    pub accepted_at: Option<DateTime<Utc>>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Assignment method tag.
    pub assignment_method: Option<AssignmentMethod>,
    /// Auto-assigned flag.
    pub auto_assigned: Option<bool>,
    /// Bump the assignment attempt counter by one.
    pub increment_attempts: bool,
    /// Admin alert cooldown anchor.
    pub last_admin_alert_at: Option<DateTime<Utc>>,
    /// Customer notice cooldown anchor.
    pub last_customer_notice_at: Option<DateTime<Utc>>,
    /// Contractor reminder cooldown anchor.
    pub last_contractor_reminder_at: Option<DateTime<Utc>>,
}

impl JobPatch {
    /// Patch for assigning (or reassigning) a job to a contractor.
    pub fn assign(
        contractor_id: ContractorId,
        method: AssignmentMethod,
        auto_assigned: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            status: Some(JobStatus::Assigned),
            contractor_id: Some(Some(contractor_id)),
            assigned_at: Some(Some(now)),
            assignment_method: Some(method),
            auto_assigned: Some(auto_assigned),
            increment_attempts: true,
            ..Self::default()
        }
    }

    /// Patch for reverting a job to `new` after exhausting candidates.
    /// Clears the contractor and the assignment timestamp together.
    pub fn revert_to_new() -> Self {
        Self {
            status: Some(JobStatus::New),
            contractor_id: Some(None),
            assigned_at: Some(None),
            ..Self::default()
        }
    }

    /// Patch for the contractor accepting the job.
    pub fn accept(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(JobStatus::Accepted),
            accepted_at: Some(now),
            ..Self::default()
        }
    }

    /// Patch for completing the job.
    pub fn complete(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            completed_at: Some(now),
            ..Self::default()
        }
    }

    /// Patch setting only the status.
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}
