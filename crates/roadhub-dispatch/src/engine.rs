//! The dispatch engine facade.
//!
//! Single entry point for external callers: the intake path, the
//! contractor-action endpoints, admin tooling, and the supervisors all
//! drive the engine through the operations here.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use roadhub_core::error::AppError;
use roadhub_core::result::AppResult;
use roadhub_core::types::id::{ContractorId, JobId};
use roadhub_entity::events::{JobEvent, RoomKey};
use roadhub_entity::job::filter::JobPatch;
use roadhub_entity::job::history::JobStatusHistory;
use roadhub_entity::job::model::Job;
use roadhub_entity::job::status::JobStatus;
use roadhub_entity::queue::entry::QueueEntry;
use roadhub_entity::queue::status::QueueEntryStatus;
use roadhub_entity::traits::channel::RealtimeChannel;
use roadhub_entity::traits::store::{JobStore, QueueStore};

use crate::assignment::{AssignmentOutcome, AssignmentService};
use crate::queue::{QueueAnalytics, QueueManager, QueueStatsReport};
use crate::timer::AcceptanceTimerRegistry;

/// The dispatch engine: assignment, queueing, timers, and analytics behind
/// one facade with injected collaborators.
#[derive(Debug, Clone)]
pub struct DispatchEngine {
    jobs: Arc<dyn JobStore>,
    queue_store: Arc<dyn QueueStore>,
    channel: Arc<dyn RealtimeChannel>,
    assignment: Arc<AssignmentService>,
    queue: QueueManager,
    timers: AcceptanceTimerRegistry,
    analytics: QueueAnalytics,
}

impl DispatchEngine {
    /// Assemble the engine from its parts.
    pub fn new(
        jobs: Arc<dyn JobStore>,
        queue_store: Arc<dyn QueueStore>,
        channel: Arc<dyn RealtimeChannel>,
        assignment: Arc<AssignmentService>,
        timers: AcceptanceTimerRegistry,
    ) -> Self {
        let queue = assignment.queue_manager().clone();
        let analytics = QueueAnalytics::new(Arc::clone(&queue_store));
        Self {
            jobs,
            queue_store,
            channel,
            assignment,
            queue,
            timers,
            analytics,
        }
    }

    /// Assign a `new` job and arm its acceptance timer.
    pub async fn auto_assign_job(&self, job_id: JobId) -> AppResult<AssignmentOutcome> {
        let outcome = self.assignment.auto_assign(job_id).await?;
        if let Some(contractor_id) = outcome.contractor_id {
            self.timers
                .start(job_id, contractor_id, Arc::clone(&self.assignment));
        }
        Ok(outcome)
    }

    /// Cancel a job's acceptance timer. Called by the acceptance path the
    /// moment a contractor accepts.
    pub fn cancel_assignment_timer(&self, job_id: JobId) -> bool {
        self.timers.cancel(job_id)
    }

    /// Record a contractor accepting their assigned job.
    ///
    /// Returns `false` when the job already moved on (another process won
    /// the race or the assignment changed hands).
    pub async fn mark_accepted(
        &self,
        job_id: JobId,
        contractor_id: ContractorId,
    ) -> AppResult<bool> {
        let Some(job) = self.jobs.get_job(job_id).await? else {
            return Err(AppError::not_found(format!("job {job_id} not found")));
        };
        if job.status != JobStatus::Assigned || job.contractor_id != Some(contractor_id) {
            debug!(
                job_id = %job_id,
                status = %job.status,
                "Acceptance ignored, job not assigned to this contractor"
            );
            return Ok(false);
        }

        let now = Utc::now();
        let updated = self
            .jobs
            .update_job(job_id, &JobPatch::accept(now), Some(JobStatus::Assigned))
            .await?;
        if !updated {
            return Ok(false);
        }

        // Whichever path transitions the job out of `assigned` first owns
        // the single timer cancellation.
        self.cancel_assignment_timer(job_id);

        self.jobs
            .add_status_history(&JobStatusHistory::transition(
                job_id,
                Some(JobStatus::Assigned),
                JobStatus::Accepted,
                Some(contractor_id),
                None,
            ))
            .await?;

        info!(job_id = %job_id, contractor_id = %contractor_id, "Job accepted");

        let event = JobEvent::StatusChanged {
            job_id,
            status: JobStatus::Accepted,
            contractor_id: Some(contractor_id),
            timestamp: now,
        };
        self.channel
            .broadcast_to_room(&RoomKey::Tracking(job_id), &event)
            .await;
        self.channel
            .broadcast_to_room(&RoomKey::Queue(contractor_id), &event)
            .await;

        Ok(true)
    }

    /// Lifecycle hook: a job finished. Completes the job record, advances
    /// the contractor's queue, and returns the newly promoted job, if any.
    pub async fn on_job_completed(
        &self,
        job_id: JobId,
        contractor_id: ContractorId,
    ) -> AppResult<Option<Job>> {
        let Some(job) = self.jobs.get_job(job_id).await? else {
            return Err(AppError::not_found(format!("job {job_id} not found")));
        };

        let now = Utc::now();
        if job.status.can_transition_to(JobStatus::Completed) {
            let updated = self
                .jobs
                .update_job(job_id, &JobPatch::complete(now), Some(job.status))
                .await?;
            if updated {
                self.cancel_assignment_timer(job_id);
                self.jobs
                    .add_status_history(&JobStatusHistory::transition(
                        job_id,
                        Some(job.status),
                        JobStatus::Completed,
                        Some(contractor_id),
                        None,
                    ))
                    .await?;

                let event = JobEvent::StatusChanged {
                    job_id,
                    status: JobStatus::Completed,
                    contractor_id: Some(contractor_id),
                    timestamp: now,
                };
                self.channel
                    .broadcast_to_room(&RoomKey::Tracking(job_id), &event)
                    .await;
            }
        } else {
            debug!(
                job_id = %job_id,
                status = %job.status,
                "Completion hook on a job that cannot complete, advancing queue only"
            );
        }

        let removed = self
            .queue
            .remove_from_queue(job_id, QueueEntryStatus::Completed)
            .await?;
        match removed {
            Some(entry) if entry.status == QueueEntryStatus::Current => {
                self.queue
                    .process_next_in_queue(contractor_id, QueueEntryStatus::Completed)
                    .await
            }
            _ => Ok(None),
        }
    }

    /// Lifecycle hook: a job was cancelled. Cascades through the timer,
    /// the job record, and the owning queue.
    pub async fn on_job_cancelled(&self, job_id: JobId) -> AppResult<()> {
        let Some(job) = self.jobs.get_job(job_id).await? else {
            return Err(AppError::not_found(format!("job {job_id} not found")));
        };
        if job.is_terminal() {
            debug!(job_id = %job_id, "Cancel hook on terminal job, nothing to do");
            return Ok(());
        }

        let now = Utc::now();
        let updated = self
            .jobs
            .update_job(
                job_id,
                &JobPatch::status(JobStatus::Cancelled),
                Some(job.status),
            )
            .await?;
        if !updated {
            debug!(job_id = %job_id, "Cancel lost the race, job already advanced");
            return Ok(());
        }

        self.cancel_assignment_timer(job_id);
        self.jobs
            .add_status_history(&JobStatusHistory::transition(
                job_id,
                Some(job.status),
                JobStatus::Cancelled,
                job.contractor_id,
                None,
            ))
            .await?;

        info!(job_id = %job_id, "Job cancelled");

        let event = JobEvent::StatusChanged {
            job_id,
            status: JobStatus::Cancelled,
            contractor_id: job.contractor_id,
            timestamp: now,
        };
        self.channel
            .broadcast_to_room(&RoomKey::Tracking(job_id), &event)
            .await;

        if let Some(contractor_id) = job.contractor_id {
            self.channel
                .broadcast_to_room(&RoomKey::Queue(contractor_id), &event)
                .await;

            let removed = self
                .queue
                .remove_from_queue(job_id, QueueEntryStatus::Expired)
                .await?;
            if matches!(removed, Some(ref entry) if entry.status == QueueEntryStatus::Current) {
                self.queue
                    .process_next_in_queue(contractor_id, QueueEntryStatus::Expired)
                    .await?;
            }
        }

        Ok(())
    }

    /// Lifecycle hook: a contractor dropped offline. Their not-yet-accepted
    /// assignments move to other contractors; accepted work stays put.
    /// Returns how many jobs were handed off.
    pub async fn on_contractor_offline(&self, contractor_id: ContractorId) -> AppResult<u32> {
        let entries = self.queue_store.active_entries(contractor_id).await?;
        let mut moved = 0;

        for entry in entries {
            // One job's failure never aborts the rest of the cascade.
            match self.reassign_offline_entry(&entry, contractor_id).await {
                Ok(true) => moved += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        job_id = %entry.job_id,
                        contractor_id = %contractor_id,
                        error = %e,
                        "Offline cascade failed for job"
                    );
                }
            }
        }

        info!(
            contractor_id = %contractor_id,
            moved,
            "Contractor offline cascade finished"
        );
        Ok(moved)
    }

    /// Move one stale queued entry to another contractor's shortest queue.
    /// Invoked by the stale-queue sweep.
    pub async fn reassign_stale_entry(&self, entry: &QueueEntry) -> AppResult<AssignmentOutcome> {
        let Some(job) = self.jobs.get_job(entry.job_id).await? else {
            return Ok(AssignmentOutcome::none());
        };
        if job.status != JobStatus::Assigned {
            debug!(
                job_id = %job.id,
                status = %job.status,
                "Stale entry's job has progressed, leaving it alone"
            );
            return Ok(AssignmentOutcome::none());
        }

        self.timers.cancel(job.id);
        let outcome = self
            .assignment
            .reassign_to_shortest_queue(&job, entry.contractor_id)
            .await?;
        if let Some(next) = outcome.contractor_id {
            self.timers.start(job.id, next, Arc::clone(&self.assignment));
        }
        Ok(outcome)
    }

    /// Aggregate queue depth/wait statistics for dashboards.
    pub async fn queue_stats(&self) -> AppResult<QueueStatsReport> {
        self.analytics.report(Utc::now()).await
    }

    /// Number of armed acceptance timers.
    pub fn active_timer_count(&self) -> usize {
        self.timers.active_count()
    }

    /// Cancel all timers for graceful shutdown.
    pub fn shutdown(&self) {
        self.timers.shutdown();
    }

    async fn reassign_offline_entry(
        &self,
        entry: &QueueEntry,
        contractor_id: ContractorId,
    ) -> AppResult<bool> {
        let Some(job) = self.jobs.get_job(entry.job_id).await? else {
            return Ok(false);
        };
        if job.status != JobStatus::Assigned {
            // Accepted or in-progress work stays with the contractor.
            return Ok(false);
        }

        self.timers.cancel(job.id);
        let outcome = self
            .assignment
            .reassign_excluding(&job, contractor_id, "contractor offline")
            .await?;
        if let Some(next) = outcome.contractor_id {
            self.timers.start(job.id, next, Arc::clone(&self.assignment));
        }
        Ok(outcome.success)
    }
}
