//! Job repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use roadhub_core::error::{AppError, ErrorKind};
use roadhub_core::result::AppResult;
use roadhub_core::types::id::{ContractorId, JobId};
use roadhub_entity::job::filter::{JobFilter, JobPatch};
use roadhub_entity::job::history::JobStatusHistory;
use roadhub_entity::job::model::{CreateJob, Job};
use roadhub_entity::job::status::JobStatus;
use roadhub_entity::traits::store::JobStore;

/// Repository for job CRUD, filtered queries, and guarded status updates.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn get_job(&self, id: JobId) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find job", e))
    }

    async fn find_jobs(&self, filter: &JobFilter) -> AppResult<Vec<Job>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM jobs WHERE 1 = 1");

        if !filter.statuses.is_empty() {
            query.push(" AND status IN (");
            let mut statuses = query.separated(", ");
            for status in &filter.statuses {
                statuses.push_bind(*status);
            }
            statuses.push_unseparated(")");
        }
        if let Some(contractor_id) = filter.contractor_id {
            query.push(" AND contractor_id = ");
            query.push_bind(contractor_id);
        }
        if let Some(before) = filter.created_before {
            query.push(" AND created_at < ");
            query.push_bind(before);
        }
        if let Some(after) = filter.created_after {
            query.push(" AND created_at >= ");
            query.push_bind(after);
        }
        if let Some(before) = filter.assigned_before {
            query.push(" AND assigned_at < ");
            query.push_bind(before);
        }
        if let Some(after) = filter.assigned_after {
            query.push(" AND assigned_at >= ");
            query.push_bind(after);
        }

        query.push(" ORDER BY created_at ASC");
        if let Some(limit) = filter.limit {
            query.push(" LIMIT ");
            query.push_bind(limit);
        }

        query
            .build_query_as::<Job>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to query jobs", e))
    }

    async fn create_job(&self, data: &CreateJob) -> AppResult<Job> {
        sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (job_number, urgency, service_type, estimated_duration_minutes, \
             customer_id, guest_name, guest_email, guest_phone, location_lat, location_lng) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(&data.job_number)
        .bind(data.urgency)
        .bind(&data.service_type)
        .bind(data.estimated_duration_minutes)
        .bind(data.customer_id)
        .bind(&data.guest_name)
        .bind(&data.guest_email)
        .bind(&data.guest_phone)
        .bind(data.location_lat)
        .bind(data.location_lng)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create job", e))
    }

    async fn update_job(
        &self,
        id: JobId,
        patch: &JobPatch,
        expected_prior: Option<JobStatus>,
    ) -> AppResult<bool> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE jobs SET updated_at = now()");

        if let Some(status) = patch.status {
            query.push(", status = ");
            query.push_bind(status);
        }
        if let Some(contractor_id) = patch.contractor_id {
            query.push(", contractor_id = ");
            query.push_bind(contractor_id);
        }
        if let Some(assigned_at) = patch.assigned_at {
            query.push(", assigned_at = ");
            query.push_bind(assigned_at);
        }
        if let Some(accepted_at) = patch.accepted_at {
            query.push(", accepted_at = ");
            query.push_bind(accepted_at);
        }
        if let Some(completed_at) = patch.completed_at {
            query.push(", completed_at = ");
            query.push_bind(completed_at);
        }
        if let Some(method) = patch.assignment_method {
            query.push(", assignment_method = ");
            query.push_bind(method);
        }
        if let Some(auto_assigned) = patch.auto_assigned {
            query.push(", auto_assigned = ");
            query.push_bind(auto_assigned);
        }
        if patch.increment_attempts {
            // Bumped server-side so the counter stays monotonic under
            // concurrent reassignments.
            query.push(", assignment_attempts = assignment_attempts + 1");
        }
        if let Some(at) = patch.last_admin_alert_at {
            query.push(", last_admin_alert_at = ");
            query.push_bind(at);
        }
        if let Some(at) = patch.last_customer_notice_at {
            query.push(", last_customer_notice_at = ");
            query.push_bind(at);
        }
        if let Some(at) = patch.last_contractor_reminder_at {
            query.push(", last_contractor_reminder_at = ");
            query.push_bind(at);
        }

        query.push(" WHERE id = ");
        query.push_bind(id);
        if let Some(expected) = expected_prior {
            query.push(" AND status = ");
            query.push_bind(expected);
        }

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update job", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_status_history(&self, entry: &JobStatusHistory) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO job_status_history (id, job_id, from_status, to_status, contractor_id, note, changed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(entry.id)
        .bind(entry.job_id)
        .bind(entry.from_status)
        .bind(entry.to_status)
        .bind(entry.contractor_id)
        .bind(&entry.note)
        .bind(entry.changed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to add status history", e)
        })?;
        Ok(())
    }

    async fn count_jobs_today(
        &self,
        contractor_id: ContractorId,
        now: DateTime<Utc>,
    ) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM jobs \
             WHERE contractor_id = $1 \
               AND status IN ('assigned', 'en_route', 'on_site', 'completed') \
               AND created_at >= date_trunc('day', $2::timestamptz)",
        )
        .bind(contractor_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count today's jobs", e)
        })
    }
}
