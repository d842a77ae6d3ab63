//! Job and queue store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use roadhub_core::result::AppResult;
use roadhub_core::types::id::{ContractorId, JobId, QueueEntryId};

use crate::job::filter::{JobFilter, JobPatch};
use crate::job::history::JobStatusHistory;
use crate::job::model::{CreateJob, Job};
use crate::job::status::JobStatus;
use crate::queue::entry::{QueueDepth, QueueEntry, QueueNotice};
use crate::queue::status::QueueEntryStatus;

/// CRUD and filtered queries over job records.
///
/// `update_job` is the single mutation path: status plus related timestamp
/// fields change together in one atomic write, optionally guarded by an
/// optimistic status precondition. A guarded update whose precondition no
/// longer holds returns `Ok(false)` — a benign no-op, not an error.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch a job by id.
    async fn get_job(&self, id: JobId) -> AppResult<Option<Job>>;

    /// Find jobs matching a filter, ordered oldest first.
    async fn find_jobs(&self, filter: &JobFilter) -> AppResult<Vec<Job>>;

    /// Create a job in state `new`. Used by the intake path and tests.
    async fn create_job(&self, data: &CreateJob) -> AppResult<Job>;

    /// Apply a patch to a job.
    ///
    /// When `expected_prior` is set, the write only happens if the job's
    /// current status matches; returns whether a row was updated.
    async fn update_job(
        &self,
        id: JobId,
        patch: &JobPatch,
        expected_prior: Option<JobStatus>,
    ) -> AppResult<bool>;

    /// Append a status history entry (audit trail).
    async fn add_status_history(&self, entry: &JobStatusHistory) -> AppResult<()>;

    /// Count a contractor's jobs today in statuses that consume daily
    /// capacity ({assigned, en_route, on_site, completed}).
    async fn count_jobs_today(
        &self,
        contractor_id: ContractorId,
        now: DateTime<Utc>,
    ) -> AppResult<i64>;
}

/// Storage operations for per-contractor queue entries.
///
/// `update_entry_status` carries the same optimistic-precondition contract
/// as `JobStore::update_job`: a stale precondition is a benign `Ok(false)`.
#[async_trait]
pub trait QueueStore: Send + Sync + std::fmt::Debug + 'static {
    /// Active (current + queued) entries for a contractor, position order.
    async fn active_entries(&self, contractor_id: ContractorId) -> AppResult<Vec<QueueEntry>>;

    /// The contractor's `current` entry, if one exists.
    async fn current_entry(&self, contractor_id: ContractorId) -> AppResult<Option<QueueEntry>>;

    /// The active entry holding a job, if the job sits in any queue.
    async fn active_entry_for_job(&self, job_id: JobId) -> AppResult<Option<QueueEntry>>;

    /// Insert a new entry.
    async fn insert_entry(&self, entry: &QueueEntry) -> AppResult<()>;

    /// Transition an entry's status, guarded by its expected prior status.
    async fn update_entry_status(
        &self,
        id: QueueEntryId,
        next: QueueEntryStatus,
        expected_prior: QueueEntryStatus,
    ) -> AppResult<bool>;

    /// Set an entry's queue position.
    async fn set_position(&self, id: QueueEntryId, position: i32) -> AppResult<()>;

    /// Set an entry's estimated start time.
    async fn set_estimated_start(
        &self,
        id: QueueEntryId,
        at: Option<DateTime<Utc>>,
    ) -> AppResult<()>;

    /// Record a notification against an entry's sent log.
    async fn append_notice(&self, id: QueueEntryId, notice: &QueueNotice) -> AppResult<()>;

    /// `queued` entries that entered their queue before the given time.
    async fn stale_queued_entries(
        &self,
        queued_before: DateTime<Utc>,
    ) -> AppResult<Vec<QueueEntry>>;

    /// Per-contractor active queue depths for analytics.
    async fn queue_depths(&self) -> AppResult<Vec<QueueDepth>>;
}
