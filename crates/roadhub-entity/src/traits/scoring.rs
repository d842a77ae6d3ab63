//! Scoring strategy trait (opaque AI candidate ranking).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use roadhub_core::result::AppResult;
use roadhub_core::types::id::ContractorId;

use crate::job::model::Job;

/// One candidate returned by the scoring strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentScore {
    /// The scored contractor.
    pub contractor_id: ContractorId,
    /// Suitability score, 0-100.
    pub score: f32,
    /// Free-text rationale from the model. Logged, never interpreted.
    pub recommendation: String,
}

/// Opaque candidate scoring for a job.
///
/// The engine treats this as a black box: scores may be stale by the time
/// they arrive, so the selector always re-validates candidates against the
/// availability evaluator. Strategy failures are expected to degrade to an
/// empty list rather than surface as assignment errors.
#[async_trait]
pub trait ScoringStrategy: Send + Sync + std::fmt::Debug + 'static {
    /// Ranked candidate scores for a job, best first. Order is stable:
    /// ties keep the strategy's ordering.
    async fn ranked_scores(&self, job: &Job) -> AppResult<Vec<AssignmentScore>>;

    /// The single best candidate, if the strategy has one.
    async fn optimal_contractor(&self, job: &Job) -> AppResult<Option<AssignmentScore>> {
        Ok(self.ranked_scores(job).await?.into_iter().next())
    }
}
