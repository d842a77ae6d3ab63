//! Assignment and queueing configuration.

use serde::{Deserialize, Serialize};

/// Assignment selector and queue manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Minimum score (0-100) for a scored candidate to be accepted.
    #[serde(default = "default_min_score")]
    pub min_acceptance_score: f32,
    /// How many ranked candidates to re-validate before falling back.
    #[serde(default = "default_candidate_cap")]
    pub max_scored_candidates: usize,
    /// Seconds a contractor has to accept an assignment before escalation.
    #[serde(default = "default_acceptance_window")]
    pub acceptance_window_seconds: u64,
    /// Seconds between the acceptance reminder and the reassignment re-check.
    #[serde(default = "default_reminder_grace")]
    pub reminder_grace_seconds: u64,
    /// Base URL of the scoring service. Unset disables AI dispatch entirely
    /// and every assignment goes through the proximity fallback.
    #[serde(default)]
    pub scoring_url: Option<String>,
    /// Scoring service request timeout in seconds.
    #[serde(default = "default_scoring_timeout")]
    pub scoring_timeout_seconds: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            min_acceptance_score: default_min_score(),
            max_scored_candidates: default_candidate_cap(),
            acceptance_window_seconds: default_acceptance_window(),
            reminder_grace_seconds: default_reminder_grace(),
            scoring_url: None,
            scoring_timeout_seconds: default_scoring_timeout(),
        }
    }
}

fn default_min_score() -> f32 {
    60.0
}

fn default_candidate_cap() -> usize {
    3
}

fn default_acceptance_window() -> u64 {
    180
}

fn default_reminder_grace() -> u64 {
    60
}

fn default_scoring_timeout() -> u64 {
    10
}
