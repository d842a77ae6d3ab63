//! Queue entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use roadhub_core::types::id::{ContractorId, JobId, QueueEntryId};

use super::status::QueueEntryStatus;

/// One job's position in one contractor's personal queue.
///
/// For a given contractor, at most one active entry is `current`, and the
/// `queued` entries carry dense 1-based positions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueueEntry {
    /// Unique entry identifier.
    pub id: QueueEntryId,
    /// The contractor whose queue this entry belongs to.
    pub contractor_id: ContractorId,
    /// The underlying job.
    pub job_id: JobId,
    /// Entry status.
    pub status: QueueEntryStatus,
    /// 1-based queue position. The `current` entry holds position 0.
    pub position: i32,
    /// When the job entered this queue.
    pub queued_at: DateTime<Utc>,
    /// FIFO-additive estimate of when work on this job starts.
    pub estimated_start_at: Option<DateTime<Utc>>,
    /// Log of queue-related notifications already sent for this entry.
    pub notifications_sent: Json<Vec<QueueNotice>>,
}

impl QueueEntry {
    /// Create a fresh entry. The caller decides `status` and `position`
    /// based on whether the target queue is empty.
    pub fn new(
        contractor_id: ContractorId,
        job_id: JobId,
        status: QueueEntryStatus,
        position: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: QueueEntryId::new(),
            contractor_id,
            job_id,
            status,
            position,
            queued_at: now,
            estimated_start_at: None,
            notifications_sent: Json(Vec::new()),
        }
    }

    /// Whether a notice of this kind was already recorded for the entry.
    pub fn notice_sent(&self, kind: &str) -> bool {
        self.notifications_sent.0.iter().any(|n| n.kind == kind)
    }
}

/// One notification recorded against a queue entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueNotice {
    /// Notification kind (template key string).
    pub kind: String,
    /// When it was sent.
    pub sent_at: DateTime<Utc>,
}

/// Aggregate queue depth for one contractor, used by analytics.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueueDepth {
    /// The contractor.
    pub contractor_id: ContractorId,
    /// Number of active (current + queued) entries.
    pub depth: i64,
    /// Oldest active `queued_at`, for wait-time statistics.
    pub oldest_queued_at: Option<DateTime<Utc>>,
}
