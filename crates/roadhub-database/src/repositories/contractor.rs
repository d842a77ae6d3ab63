//! Contractor directory repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use roadhub_core::error::{AppError, ErrorKind};
use roadhub_core::result::AppResult;
use roadhub_core::types::geo::GeoPoint;
use roadhub_core::types::id::ContractorId;
use roadhub_entity::contractor::profile::ContractorProfile;
use roadhub_entity::contractor::vacation::VacationRequest;
use roadhub_entity::traits::directory::ContractorDirectory;

/// Repository over contractor profiles and vacation requests.
#[derive(Debug, Clone)]
pub struct ContractorRepository {
    pool: PgPool,
}

impl ContractorRepository {
    /// Create a new contractor repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContractorDirectory for ContractorRepository {
    async fn get_contractor(&self, id: ContractorId) -> AppResult<Option<ContractorProfile>> {
        sqlx::query_as::<_, ContractorProfile>("SELECT * FROM contractors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find contractor", e)
            })
    }

    async fn approved_vacations(&self, id: ContractorId) -> AppResult<Vec<VacationRequest>> {
        sqlx::query_as::<_, VacationRequest>(
            "SELECT * FROM vacation_requests \
             WHERE contractor_id = $1 AND status = 'approved' ORDER BY starts_at ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find vacations", e))
    }

    async fn available_for_assignment(
        &self,
        near: Option<GeoPoint>,
    ) -> AppResult<Vec<ContractorProfile>> {
        let mut contractors = sqlx::query_as::<_, ContractorProfile>(
            "SELECT * FROM contractors WHERE online = TRUE AND available = TRUE",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list available contractors", e)
        })?;

        // Proximity ordering happens here rather than in SQL; contractors
        // without a stored base location sort last.
        if let Some(point) = near {
            contractors.sort_by(|a, b| {
                let da = a.location().map(|l| l.distance_km(&point));
                let db = b.location().map(|l| l.distance_km(&point));
                match (da, db) {
                    (Some(x), Some(y)) => x.total_cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
            });
        }

        Ok(contractors)
    }
}
