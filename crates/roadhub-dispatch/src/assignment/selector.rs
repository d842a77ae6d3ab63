//! Assignment selector: scoring with availability re-validation, then a
//! proximity/round-robin fallback.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use roadhub_core::config::dispatch::DispatchConfig;
use roadhub_core::result::AppResult;
use roadhub_core::types::id::ContractorId;
use roadhub_entity::job::model::Job;
use roadhub_entity::job::status::AssignmentMethod;
use roadhub_entity::traits::directory::ContractorDirectory;
use roadhub_entity::traits::scoring::ScoringStrategy;

use crate::availability::AvailabilityService;

/// The selector's verdict for a job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedContractor {
    /// The chosen contractor.
    pub contractor_id: ContractorId,
    /// How the choice was made (recorded on the job for analytics).
    pub method: AssignmentMethod,
    /// The winning score, when the scoring path produced the pick.
    pub score: Option<f32>,
}

/// Picks a contractor for a job.
///
/// Scores may be stale by the time they arrive, so every scored candidate
/// is re-validated against the availability evaluator at selection time.
/// No usable scored candidate means the proximity fallback; no fallback
/// candidate means the job stays `new` for the next supervisor sweep.
#[derive(Debug, Clone)]
pub struct AssignmentSelector {
    scoring: Arc<dyn ScoringStrategy>,
    directory: Arc<dyn ContractorDirectory>,
    availability: AvailabilityService,
    config: DispatchConfig,
}

impl AssignmentSelector {
    /// Create a new selector.
    pub fn new(
        scoring: Arc<dyn ScoringStrategy>,
        directory: Arc<dyn ContractorDirectory>,
        availability: AvailabilityService,
        config: DispatchConfig,
    ) -> Self {
        Self {
            scoring,
            directory,
            availability,
            config,
        }
    }

    /// Select a contractor for the job.
    pub async fn select(
        &self,
        job: &Job,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SelectedContractor>> {
        self.select_excluding(job, &[], now).await
    }

    /// Select a contractor, skipping the excluded ids (used by
    /// reassignment to rule out the contractor being replaced).
    pub async fn select_excluding(
        &self,
        job: &Job,
        excluded: &[ContractorId],
        now: DateTime<Utc>,
    ) -> AppResult<Option<SelectedContractor>> {
        if let Some(pick) = self.select_scored(job, excluded, now).await? {
            return Ok(Some(pick));
        }
        self.select_fallback(job, excluded, now).await
    }

    /// Scoring path: take the ranked list, and if the top score clears the
    /// acceptance threshold, walk down at most `max_scored_candidates`
    /// entries re-validating each against the evaluator. Ties keep the
    /// strategy's order; the list is never re-sorted here.
    async fn select_scored(
        &self,
        job: &Job,
        excluded: &[ContractorId],
        now: DateTime<Utc>,
    ) -> AppResult<Option<SelectedContractor>> {
        let scores = match self.scoring.ranked_scores(job).await {
            Ok(scores) => scores,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Scoring strategy failed, using fallback");
                return Ok(None);
            }
        };

        let candidates: Vec<_> = scores
            .into_iter()
            .filter(|s| !excluded.contains(&s.contractor_id))
            .collect();

        let Some(top) = candidates.first() else {
            return Ok(None);
        };
        if top.score < self.config.min_acceptance_score {
            debug!(
                job_id = %job.id,
                top_score = top.score,
                threshold = self.config.min_acceptance_score,
                "Top score below acceptance threshold"
            );
            return Ok(None);
        }

        for candidate in candidates.iter().take(self.config.max_scored_candidates) {
            match self.availability.check(candidate.contractor_id, now).await? {
                Some(Ok(())) => {
                    debug!(
                        job_id = %job.id,
                        contractor_id = %candidate.contractor_id,
                        score = candidate.score,
                        recommendation = %candidate.recommendation,
                        "Scored candidate selected"
                    );
                    return Ok(Some(SelectedContractor {
                        contractor_id: candidate.contractor_id,
                        method: AssignmentMethod::AiDispatch,
                        score: Some(candidate.score),
                    }));
                }
                Some(Err(_)) | None => continue,
            }
        }

        Ok(None)
    }

    /// Fallback path: all flag-available contractors ordered by distance to
    /// the job (arbitrary order when the job has no location), first one
    /// passing full evaluation wins.
    async fn select_fallback(
        &self,
        job: &Job,
        excluded: &[ContractorId],
        now: DateTime<Utc>,
    ) -> AppResult<Option<SelectedContractor>> {
        let candidates = self
            .directory
            .available_for_assignment(job.location())
            .await?;

        for contractor in candidates {
            if excluded.contains(&contractor.id) {
                continue;
            }
            let contractor_id = contractor.id;
            if self
                .availability
                .check_profile(contractor, now)
                .await?
                .is_ok()
            {
                debug!(
                    job_id = %job.id,
                    contractor_id = %contractor_id,
                    "Fallback candidate selected"
                );
                return Ok(Some(SelectedContractor {
                    contractor_id,
                    method: AssignmentMethod::RoundRobin,
                    score: None,
                }));
            }
        }

        debug!(job_id = %job.id, "No available contractor found");
        Ok(None)
    }
}
