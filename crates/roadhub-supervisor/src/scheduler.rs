//! Cron scheduler for the supervisor sweeps.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use roadhub_core::error::AppError;

use crate::sweeps::{ReminderSweep, StaleQueueSweep, UnassignedJobMonitor};

/// Cron-based scheduler driving the periodic supervisors.
pub struct SupervisorScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Unassigned-job monitor (every 60s)
    unassigned: Arc<UnassignedJobMonitor>,
    /// Reminder sweep (every 30s)
    reminder: Arc<ReminderSweep>,
    /// Stale-queue sweep (every 5min)
    stale_queue: Arc<StaleQueueSweep>,
}

impl std::fmt::Debug for SupervisorScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisorScheduler").finish()
    }
}

impl SupervisorScheduler {
    /// Create a new supervisor scheduler
    pub async fn new(
        unassigned: Arc<UnassignedJobMonitor>,
        reminder: Arc<ReminderSweep>,
        stale_queue: Arc<StaleQueueSweep>,
    ) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            unassigned,
            reminder,
            stale_queue,
        })
    }

    /// Register all supervisor sweeps
    pub async fn register_default_sweeps(&self) -> Result<(), AppError> {
        self.register_unassigned_monitor().await?;
        self.register_reminder_sweep().await?;
        self.register_stale_queue_sweep().await?;

        tracing::info!("All supervisor sweeps registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Supervisor scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Supervisor scheduler shut down");
        Ok(())
    }

    /// Unassigned-job monitor — every 60 seconds
    async fn register_unassigned_monitor(&self) -> Result<(), AppError> {
        let monitor = Arc::clone(&self.unassigned);
        let job = CronJob::new_async("0 * * * * *", move |_uuid, _lock| {
            let monitor = Arc::clone(&monitor);
            Box::pin(async move {
                monitor.run().await;
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Failed to create unassigned_monitor schedule: {}", e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add unassigned_monitor schedule: {}", e))
        })?;

        tracing::info!("Registered: unassigned_monitor (every 60s)");
        Ok(())
    }

    /// Reminder sweep — every 30 seconds
    async fn register_reminder_sweep(&self) -> Result<(), AppError> {
        let sweep = Arc::clone(&self.reminder);
        let job = CronJob::new_async("*/30 * * * * *", move |_uuid, _lock| {
            let sweep = Arc::clone(&sweep);
            Box::pin(async move {
                sweep.run().await;
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Failed to create reminder_sweep schedule: {}", e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add reminder_sweep schedule: {}", e))
        })?;

        tracing::info!("Registered: reminder_sweep (every 30s)");
        Ok(())
    }

    /// Stale-queue sweep — every 5 minutes
    async fn register_stale_queue_sweep(&self) -> Result<(), AppError> {
        let sweep = Arc::clone(&self.stale_queue);
        let job = CronJob::new_async("0 */5 * * * *", move |_uuid, _lock| {
            let sweep = Arc::clone(&sweep);
            Box::pin(async move {
                sweep.run().await;
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Failed to create stale_queue_sweep schedule: {}", e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add stale_queue_sweep schedule: {}", e))
        })?;

        tracing::info!("Registered: stale_queue_sweep (every 5min)");
        Ok(())
    }
}
