//! Aggregate queue statistics for operational dashboards.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roadhub_core::result::AppResult;
use roadhub_entity::queue::entry::QueueDepth;
use roadhub_entity::traits::store::QueueStore;

/// Aggregate depth and wait-time statistics across all contractor queues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatsReport {
    /// Total active (current + queued) entries across all queues.
    pub total_active: i64,
    /// Number of contractors with a non-empty queue.
    pub contractors_with_queues: usize,
    /// Deepest single queue.
    pub max_depth: i64,
    /// Mean queue depth across non-empty queues.
    pub avg_depth: f64,
    /// Longest current wait among queued entries, in minutes.
    pub oldest_wait_minutes: Option<i64>,
    /// Per-contractor breakdown.
    pub per_contractor: Vec<QueueDepth>,
}

/// Computes queue statistics on demand.
#[derive(Debug, Clone)]
pub struct QueueAnalytics {
    store: Arc<dyn QueueStore>,
}

impl QueueAnalytics {
    /// Create a new analytics reader.
    pub fn new(store: Arc<dyn QueueStore>) -> Self {
        Self { store }
    }

    /// Build the aggregate report.
    pub async fn report(&self, now: DateTime<Utc>) -> AppResult<QueueStatsReport> {
        let per_contractor = self.store.queue_depths().await?;

        let total_active: i64 = per_contractor.iter().map(|d| d.depth).sum();
        let max_depth = per_contractor.iter().map(|d| d.depth).max().unwrap_or(0);
        let contractors_with_queues = per_contractor.len();
        let avg_depth = if contractors_with_queues == 0 {
            0.0
        } else {
            total_active as f64 / contractors_with_queues as f64
        };
        let oldest_wait_minutes = per_contractor
            .iter()
            .filter_map(|d| d.oldest_queued_at)
            .map(|at| (now - at).num_minutes())
            .max();

        Ok(QueueStatsReport {
            total_active,
            contractors_with_queues,
            max_depth,
            avg_depth,
            oldest_wait_minutes,
            per_contractor,
        })
    }
}
