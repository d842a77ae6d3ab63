//! Availability snapshot assembly.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use roadhub_core::result::AppResult;
use roadhub_core::types::id::ContractorId;
use roadhub_entity::contractor::profile::ContractorProfile;
use roadhub_entity::contractor::vacation::VacationRequest;
use roadhub_entity::traits::directory::ContractorDirectory;
use roadhub_entity::traits::store::JobStore;

use super::evaluator::{evaluate, UnavailableReason};

/// Point-in-time inputs for the availability predicate. Never persisted;
/// recomputed on every evaluation.
#[derive(Debug, Clone)]
pub struct AvailabilitySnapshot {
    /// The contractor's profile (flags, schedule, cap, location).
    pub contractor: ContractorProfile,
    /// Approved vacation intervals.
    pub vacations: Vec<VacationRequest>,
    /// Today's jobs in capacity-consuming statuses.
    pub jobs_today: i64,
}

/// Assembles snapshots and runs the evaluator over them.
///
/// The flag checks are free, so the builder skips the vacation and
/// job-count store lookups entirely when the flags already fail.
#[derive(Debug, Clone)]
pub struct AvailabilityService {
    directory: Arc<dyn ContractorDirectory>,
    jobs: Arc<dyn JobStore>,
}

impl AvailabilityService {
    /// Create a new availability service.
    pub fn new(directory: Arc<dyn ContractorDirectory>, jobs: Arc<dyn JobStore>) -> Self {
        Self { directory, jobs }
    }

    /// Evaluate a contractor by id.
    ///
    /// Returns `Ok(None)` when the contractor does not exist; otherwise the
    /// inner result is the evaluator's verdict.
    pub async fn check(
        &self,
        contractor_id: ContractorId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Result<(), UnavailableReason>>> {
        let Some(contractor) = self.directory.get_contractor(contractor_id).await? else {
            return Ok(None);
        };
        Ok(Some(self.check_profile(contractor, now).await?))
    }

    /// Evaluate a pre-fetched profile (used by the fallback path, which
    /// already holds the candidate list).
    pub async fn check_profile(
        &self,
        contractor: ContractorProfile,
        now: DateTime<Utc>,
    ) -> AppResult<Result<(), UnavailableReason>> {
        let contractor_id = contractor.id;

        let snapshot = if contractor.online && contractor.available {
            let vacations = self.directory.approved_vacations(contractor_id).await?;
            let jobs_today = self.jobs.count_jobs_today(contractor_id, now).await?;
            AvailabilitySnapshot {
                contractor,
                vacations,
                jobs_today,
            }
        } else {
            AvailabilitySnapshot {
                contractor,
                vacations: Vec::new(),
                jobs_today: 0,
            }
        };

        let verdict = evaluate(&snapshot, now);
        if let Err(reason) = verdict {
            debug!(
                contractor_id = %contractor_id,
                reason = %reason,
                "Contractor unavailable"
            );
        }
        Ok(verdict)
    }
}
