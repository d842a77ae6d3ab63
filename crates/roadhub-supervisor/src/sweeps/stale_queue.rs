//! Stale-queue sweep.
//!
//! Finds `queued` entries that have dwelled past the configured limit with
//! no progress and hands their jobs to a different contractor's shortest
//! queue.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use roadhub_core::config::supervisor::SupervisorConfig;
use roadhub_core::result::AppResult;
use roadhub_dispatch::DispatchEngine;
use roadhub_entity::traits::store::QueueStore;

/// Periodic sweep over long-dwelling queued entries.
#[derive(Debug)]
pub struct StaleQueueSweep {
    queue: Arc<dyn QueueStore>,
    engine: Arc<DispatchEngine>,
    config: SupervisorConfig,
    running: Mutex<()>,
}

impl StaleQueueSweep {
    /// Create a new stale-queue sweep.
    pub fn new(
        queue: Arc<dyn QueueStore>,
        engine: Arc<DispatchEngine>,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            queue,
            engine,
            config,
            running: Mutex::new(()),
        }
    }

    /// Scheduler entry point with the overlap guard.
    pub async fn run(&self) {
        let Ok(_guard) = self.running.try_lock() else {
            debug!("Stale-queue sweep still running, skipping tick");
            return;
        };
        match self.run_once(Utc::now()).await {
            Ok(moved) if moved > 0 => info!(moved, "Stale-queue sweep pass complete"),
            Ok(_) => {}
            Err(e) => error!(error = %e, "Stale-queue sweep pass failed"),
        }
    }

    /// One full pass at the given instant. Returns how many jobs moved.
    pub async fn run_once(&self, now: DateTime<Utc>) -> AppResult<u32> {
        let cutoff = now - Duration::hours(self.config.stale_queue_dwell_hours);
        let entries = self.queue.stale_queued_entries(cutoff).await?;

        let mut moved = 0;
        for entry in entries {
            match self.engine.reassign_stale_entry(&entry).await {
                Ok(outcome) if outcome.success => moved += 1,
                Ok(_) => {}
                Err(e) => {
                    error!(
                        job_id = %entry.job_id,
                        contractor_id = %entry.contractor_id,
                        error = %e,
                        "Stale reassignment failed, continuing sweep"
                    );
                }
            }
        }
        Ok(moved)
    }
}
