//! Queue entry repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use roadhub_core::error::{AppError, ErrorKind};
use roadhub_core::result::AppResult;
use roadhub_core::types::id::{ContractorId, JobId, QueueEntryId};
use roadhub_entity::queue::entry::{QueueDepth, QueueEntry, QueueNotice};
use roadhub_entity::queue::status::QueueEntryStatus;
use roadhub_entity::traits::store::QueueStore;

/// Repository for per-contractor queue entries.
#[derive(Debug, Clone)]
pub struct QueueRepository {
    pool: PgPool,
}

impl QueueRepository {
    /// Create a new queue repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueStore for QueueRepository {
    async fn active_entries(&self, contractor_id: ContractorId) -> AppResult<Vec<QueueEntry>> {
        sqlx::query_as::<_, QueueEntry>(
            "SELECT * FROM queue_entries \
             WHERE contractor_id = $1 AND status IN ('queued', 'current', 'assigned') \
             ORDER BY position ASC",
        )
        .bind(contractor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list queue entries", e))
    }

    async fn current_entry(&self, contractor_id: ContractorId) -> AppResult<Option<QueueEntry>> {
        sqlx::query_as::<_, QueueEntry>(
            "SELECT * FROM queue_entries WHERE contractor_id = $1 AND status = 'current'",
        )
        .bind(contractor_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find current entry", e))
    }

    async fn active_entry_for_job(&self, job_id: JobId) -> AppResult<Option<QueueEntry>> {
        sqlx::query_as::<_, QueueEntry>(
            "SELECT * FROM queue_entries \
             WHERE job_id = $1 AND status IN ('queued', 'current', 'assigned')",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find job entry", e))
    }

    async fn insert_entry(&self, entry: &QueueEntry) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO queue_entries \
             (id, contractor_id, job_id, status, position, queued_at, estimated_start_at, notifications_sent) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(entry.id)
        .bind(entry.contractor_id)
        .bind(entry.job_id)
        .bind(entry.status)
        .bind(entry.position)
        .bind(entry.queued_at)
        .bind(entry.estimated_start_at)
        .bind(&entry.notifications_sent)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert queue entry", e))?;
        Ok(())
    }

    async fn update_entry_status(
        &self,
        id: QueueEntryId,
        next: QueueEntryStatus,
        expected_prior: QueueEntryStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE queue_entries SET status = $2 WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(next)
        .bind(expected_prior)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update entry status", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_position(&self, id: QueueEntryId, position: i32) -> AppResult<()> {
        sqlx::query("UPDATE queue_entries SET position = $2 WHERE id = $1")
            .bind(id)
            .bind(position)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to set entry position", e)
            })?;
        Ok(())
    }

    async fn set_estimated_start(
        &self,
        id: QueueEntryId,
        at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE queue_entries SET estimated_start_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to set estimated start", e)
            })?;
        Ok(())
    }

    async fn append_notice(&self, id: QueueEntryId, notice: &QueueNotice) -> AppResult<()> {
        sqlx::query(
            "UPDATE queue_entries \
             SET notifications_sent = notifications_sent || $2::jsonb WHERE id = $1",
        )
        .bind(id)
        .bind(Json(vec![notice.clone()]))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to append notice", e))?;
        Ok(())
    }

    async fn stale_queued_entries(
        &self,
        queued_before: DateTime<Utc>,
    ) -> AppResult<Vec<QueueEntry>> {
        sqlx::query_as::<_, QueueEntry>(
            "SELECT * FROM queue_entries \
             WHERE status = 'queued' AND queued_at < $1 ORDER BY queued_at ASC",
        )
        .bind(queued_before)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find stale entries", e))
    }

    async fn queue_depths(&self) -> AppResult<Vec<QueueDepth>> {
        sqlx::query_as::<_, QueueDepth>(
            "SELECT contractor_id, COUNT(*) AS depth, \
             MIN(queued_at) FILTER (WHERE status = 'queued') AS oldest_queued_at \
             FROM queue_entries \
             WHERE status IN ('queued', 'current', 'assigned') \
             GROUP BY contractor_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to query queue depths", e))
    }
}
