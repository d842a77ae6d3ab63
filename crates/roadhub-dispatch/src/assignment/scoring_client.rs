//! HTTP client for the opaque AI scoring service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use roadhub_core::config::dispatch::DispatchConfig;
use roadhub_core::result::AppResult;
use roadhub_core::types::id::ContractorId;
use roadhub_entity::job::model::Job;
use roadhub_entity::traits::scoring::{AssignmentScore, ScoringStrategy};

/// Response shape of the scoring service's ranking endpoint.
#[derive(Debug, Deserialize)]
struct ScoreResponse {
    scores: Vec<ScoredCandidate>,
}

#[derive(Debug, Deserialize)]
struct ScoredCandidate {
    contractor_id: ContractorId,
    score: f32,
    #[serde(default)]
    recommendation: String,
}

/// [`ScoringStrategy`] backed by the remote scoring service.
///
/// Any transport or decoding failure degrades to an empty candidate list so
/// the selector falls through to the proximity fallback — scoring outages
/// must never block assignment.
#[derive(Debug, Clone)]
pub struct ScoringClient {
    http: reqwest::Client,
    base_url: String,
}

impl ScoringClient {
    /// Build a client from configuration. Returns `None` when no scoring
    /// URL is configured.
    pub fn from_config(config: &DispatchConfig) -> Option<Self> {
        let base_url = config.scoring_url.clone()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.scoring_timeout_seconds))
            .build()
            .ok()?;
        Some(Self { http, base_url })
    }
}

#[async_trait]
impl ScoringStrategy for ScoringClient {
    async fn ranked_scores(&self, job: &Job) -> AppResult<Vec<AssignmentScore>> {
        let url = format!("{}/v1/assignment-scores", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "job_id": job.id,
            "service_type": job.service_type,
            "urgency": job.urgency,
            "location": job.location(),
        });

        let response = match self.http.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Scoring service unreachable");
                return Ok(Vec::new());
            }
        };

        if !response.status().is_success() {
            warn!(
                job_id = %job.id,
                status = %response.status(),
                "Scoring service returned an error status"
            );
            return Ok(Vec::new());
        }

        match response.json::<ScoreResponse>().await {
            Ok(parsed) => Ok(parsed
                .scores
                .into_iter()
                .map(|c| AssignmentScore {
                    contractor_id: c.contractor_id,
                    score: c.score,
                    recommendation: c.recommendation,
                })
                .collect()),
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Scoring response failed to decode");
                Ok(Vec::new())
            }
        }
    }
}

/// [`ScoringStrategy`] used when no scoring service is configured: every
/// assignment goes straight to the proximity fallback.
#[derive(Debug, Clone, Default)]
pub struct DisabledScoring;

#[async_trait]
impl ScoringStrategy for DisabledScoring {
    async fn ranked_scores(&self, _job: &Job) -> AppResult<Vec<AssignmentScore>> {
        Ok(Vec::new())
    }
}
