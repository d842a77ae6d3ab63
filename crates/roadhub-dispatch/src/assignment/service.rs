//! Assignment service: commits assignments, drives acceptance-timeout
//! escalation, reassignments, and the revert-to-new path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use roadhub_core::config::dispatch::DispatchConfig;
use roadhub_core::result::AppResult;
use roadhub_core::types::id::{ContractorId, JobId};
use roadhub_entity::events::{JobEvent, RoomKey};
use roadhub_entity::job::filter::JobPatch;
use roadhub_entity::job::history::JobStatusHistory;
use roadhub_entity::job::model::Job;
use roadhub_entity::job::status::{AssignmentMethod, JobStatus};
use roadhub_entity::queue::status::QueueEntryStatus;
use roadhub_entity::traits::channel::RealtimeChannel;
use roadhub_entity::traits::directory::ContractorDirectory;
use roadhub_entity::traits::notifier::{NotificationSender, TemplateKey};
use roadhub_entity::traits::store::{JobStore, QueueStore};

use crate::availability::AvailabilityService;
use crate::queue::QueueManager;

use super::selector::{AssignmentSelector, SelectedContractor};

/// Result of an assignment attempt. "No candidate" is a valid outcome, not
/// an error: the job stays `new` and the next supervisor sweep retries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssignmentOutcome {
    /// Whether a contractor was assigned.
    pub success: bool,
    /// The assigned contractor, when successful.
    pub contractor_id: Option<ContractorId>,
}

impl AssignmentOutcome {
    /// An unsuccessful outcome.
    pub fn none() -> Self {
        Self {
            success: false,
            contractor_id: None,
        }
    }

    /// A successful outcome.
    pub fn assigned(contractor_id: ContractorId) -> Self {
        Self {
            success: true,
            contractor_id: Some(contractor_id),
        }
    }
}

/// Commits assignment decisions against the job store and fans out the
/// consequences (queueing, events, notifications).
///
/// Every status write is guarded by an optimistic precondition; a stale
/// precondition means another process already advanced the job and the
/// write degrades to a logged no-op.
#[derive(Debug, Clone)]
pub struct AssignmentService {
    jobs: Arc<dyn JobStore>,
    queue_store: Arc<dyn QueueStore>,
    directory: Arc<dyn ContractorDirectory>,
    notifier: Arc<dyn NotificationSender>,
    channel: Arc<dyn RealtimeChannel>,
    selector: AssignmentSelector,
    availability: AvailabilityService,
    queue: QueueManager,
    config: DispatchConfig,
}

impl AssignmentService {
    /// Create a new assignment service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        jobs: Arc<dyn JobStore>,
        queue_store: Arc<dyn QueueStore>,
        directory: Arc<dyn ContractorDirectory>,
        notifier: Arc<dyn NotificationSender>,
        channel: Arc<dyn RealtimeChannel>,
        selector: AssignmentSelector,
        availability: AvailabilityService,
        queue: QueueManager,
        config: DispatchConfig,
    ) -> Self {
        Self {
            jobs,
            queue_store,
            directory,
            notifier,
            channel,
            selector,
            availability,
            queue,
            config,
        }
    }

    /// The queue manager this service commits through.
    pub fn queue_manager(&self) -> &QueueManager {
        &self.queue
    }

    /// Assign a `new` job to the best available contractor.
    pub async fn auto_assign(&self, job_id: JobId) -> AppResult<AssignmentOutcome> {
        let Some(job) = self.jobs.get_job(job_id).await? else {
            warn!(job_id = %job_id, "Auto-assign requested for unknown job");
            return Ok(AssignmentOutcome::none());
        };
        if job.status != JobStatus::New {
            debug!(
                job_id = %job_id,
                status = %job.status,
                "Job no longer new, skipping auto-assign"
            );
            return Ok(AssignmentOutcome::none());
        }

        let now = Utc::now();
        let Some(pick) = self.selector.select(&job, now).await? else {
            info!(job_id = %job_id, "No available contractor, job stays unassigned");
            return Ok(AssignmentOutcome::none());
        };

        self.commit_assignment(&job, pick, JobStatus::New).await
    }

    /// Acceptance-timeout escalation for one job/contractor pair.
    ///
    /// Safe to invoke more than once for the same pair: every step
    /// re-reads the job and aborts when the state no longer matches
    /// (stale-timer guard), so a duplicate invocation collapses into a
    /// no-op after the first reassignment lands.
    ///
    /// Returns the replacement contractor when a reassignment happened, so
    /// the caller can arm a fresh acceptance timer.
    pub async fn handle_acceptance_timeout(
        &self,
        job_id: JobId,
        contractor_id: ContractorId,
    ) -> AppResult<Option<ContractorId>> {
        let Some(job) = self.jobs.get_job(job_id).await? else {
            return Ok(None);
        };
        if !still_awaiting(&job, contractor_id) {
            debug!(
                job_id = %job_id,
                status = %job.status,
                "Acceptance timer stale, nothing to escalate"
            );
            return Ok(None);
        }

        self.send_acceptance_reminder(&job, contractor_id).await?;

        tokio::time::sleep(StdDuration::from_secs(self.config.reminder_grace_seconds)).await;

        let Some(job) = self.jobs.get_job(job_id).await? else {
            return Ok(None);
        };
        if !still_awaiting(&job, contractor_id) {
            debug!(job_id = %job_id, "Contractor accepted during grace period");
            return Ok(None);
        }

        let outcome = self
            .reassign_excluding(&job, contractor_id, "acceptance timeout")
            .await?;
        Ok(outcome.contractor_id)
    }

    /// Reassign an `assigned` job away from `exclude`.
    ///
    /// The replacement must pass the full availability evaluation (which
    /// requires being online). When no candidate exists the job reverts to
    /// `new` — contractor and assignment timestamp cleared — instead of
    /// looping indefinitely.
    pub async fn reassign_excluding(
        &self,
        job: &Job,
        exclude: ContractorId,
        note: &str,
    ) -> AppResult<AssignmentOutcome> {
        let now = Utc::now();
        match self.selector.select_excluding(job, &[exclude], now).await? {
            Some(pick) => {
                self.commit_reassignment(job, exclude, pick.contractor_id, pick.method, note)
                    .await
            }
            None => {
                self.revert_to_new(job, exclude, note).await?;
                Ok(AssignmentOutcome::none())
            }
        }
    }

    /// Move a stale queued job to the shortest eligible queue.
    ///
    /// Candidates are the flag-available contractors (minus the vacated
    /// one) that pass full evaluation; ties on depth keep proximity order.
    pub async fn reassign_to_shortest_queue(
        &self,
        job: &Job,
        exclude: ContractorId,
    ) -> AppResult<AssignmentOutcome> {
        let now = Utc::now();

        let candidates = self
            .directory
            .available_for_assignment(job.location())
            .await?;
        let depths: HashMap<ContractorId, i64> = self
            .queue_store
            .queue_depths()
            .await?
            .into_iter()
            .map(|d| (d.contractor_id, d.depth))
            .collect();

        let mut eligible = Vec::new();
        for contractor in candidates {
            if contractor.id == exclude {
                continue;
            }
            let id = contractor.id;
            if self
                .availability
                .check_profile(contractor, now)
                .await?
                .is_ok()
            {
                eligible.push(id);
            }
        }

        let Some(target) = eligible
            .into_iter()
            .min_by_key(|id| depths.get(id).copied().unwrap_or(0))
        else {
            debug!(job_id = %job.id, "No eligible queue for stale job");
            return Ok(AssignmentOutcome::none());
        };

        self.commit_reassignment(
            job,
            exclude,
            target,
            AssignmentMethod::RoundRobin,
            "stale queue entry",
        )
        .await
    }

    /// Commit a fresh assignment of a `new` job.
    async fn commit_assignment(
        &self,
        job: &Job,
        pick: SelectedContractor,
        expected_prior: JobStatus,
    ) -> AppResult<AssignmentOutcome> {
        let now = Utc::now();
        let patch = JobPatch::assign(pick.contractor_id, pick.method, true, now);
        let updated = self
            .jobs
            .update_job(job.id, &patch, Some(expected_prior))
            .await?;
        if !updated {
            debug!(job_id = %job.id, "Assignment lost the race, job already advanced");
            return Ok(AssignmentOutcome::none());
        }

        self.jobs
            .add_status_history(&JobStatusHistory::transition(
                job.id,
                Some(job.status),
                JobStatus::Assigned,
                Some(pick.contractor_id),
                Some(format!("auto assignment via {}", pick.method)),
            ))
            .await?;

        self.queue.add_to_queue(pick.contractor_id, job).await?;

        info!(
            job_id = %job.id,
            contractor_id = %pick.contractor_id,
            method = %pick.method,
            score = ?pick.score,
            "Job assigned"
        );

        let event = JobEvent::Assigned {
            job_id: job.id,
            contractor_id: pick.contractor_id,
            method: pick.method,
            attempts: job.assignment_attempts + 1,
            timestamp: now,
        };
        self.channel
            .broadcast_to_room(&RoomKey::Tracking(job.id), &event)
            .await;
        self.channel
            .broadcast_to_room(&RoomKey::Bidding(job.id), &event)
            .await;
        self.channel
            .broadcast_to_room(&RoomKey::Queue(pick.contractor_id), &event)
            .await;

        self.notify_contractor(
            pick.contractor_id,
            TemplateKey::ContractorAssigned,
            serde_json::json!({
                "job_number": job.job_number,
                "service_type": job.service_type,
                "urgency": job.urgency,
            }),
        )
        .await;

        Ok(AssignmentOutcome::assigned(pick.contractor_id))
    }

    /// Commit a reassignment from one contractor to another.
    async fn commit_reassignment(
        &self,
        job: &Job,
        from: ContractorId,
        to: ContractorId,
        method: AssignmentMethod,
        note: &str,
    ) -> AppResult<AssignmentOutcome> {
        let now = Utc::now();
        let patch = JobPatch::assign(to, method, true, now);
        let updated = self
            .jobs
            .update_job(job.id, &patch, Some(JobStatus::Assigned))
            .await?;
        if !updated {
            debug!(job_id = %job.id, "Reassignment lost the race, job already advanced");
            return Ok(AssignmentOutcome::none());
        }

        self.jobs
            .add_status_history(&JobStatusHistory::transition(
                job.id,
                Some(JobStatus::Assigned),
                JobStatus::Assigned,
                Some(to),
                Some(format!("reassigned from {from}: {note}")),
            ))
            .await?;

        let vacated = self
            .queue
            .remove_from_queue(job.id, QueueEntryStatus::Reassigned)
            .await?;
        if matches!(vacated, Some(ref entry) if entry.status == QueueEntryStatus::Current) {
            // The old contractor lost their current job; their queue moves on.
            self.queue
                .process_next_in_queue(from, QueueEntryStatus::Reassigned)
                .await?;
        }
        self.queue.add_to_queue(to, job).await?;

        info!(
            job_id = %job.id,
            from_contractor = %from,
            to_contractor = %to,
            attempts = job.assignment_attempts + 1,
            note,
            "Job reassigned"
        );

        let event = JobEvent::Reassigned {
            job_id: job.id,
            from_contractor: Some(from),
            to_contractor: to,
            attempts: job.assignment_attempts + 1,
            timestamp: now,
        };
        // Cross-room event: published once into each relevant room.
        self.channel
            .broadcast_to_room(&RoomKey::Tracking(job.id), &event)
            .await;
        self.channel
            .broadcast_to_room(&RoomKey::Queue(from), &event)
            .await;
        self.channel
            .broadcast_to_room(&RoomKey::Queue(to), &event)
            .await;

        let context = serde_json::json!({
            "job_number": job.job_number,
            "service_type": job.service_type,
        });
        self.notify_contractor(from, TemplateKey::ContractorQueueVacated, context.clone())
            .await;
        self.notify_contractor(to, TemplateKey::ContractorQueueReceived, context)
            .await;

        Ok(AssignmentOutcome::assigned(to))
    }

    /// Revert an `assigned` job to `new` after exhausting candidates.
    async fn revert_to_new(&self, job: &Job, from: ContractorId, note: &str) -> AppResult<()> {
        let now = Utc::now();
        let updated = self
            .jobs
            .update_job(job.id, &JobPatch::revert_to_new(), Some(JobStatus::Assigned))
            .await?;
        if !updated {
            debug!(job_id = %job.id, "Revert lost the race, job already advanced");
            return Ok(());
        }

        self.jobs
            .add_status_history(&JobStatusHistory::transition(
                job.id,
                Some(JobStatus::Assigned),
                JobStatus::New,
                None,
                Some(format!("no candidate on {note}, reverted to unassigned")),
            ))
            .await?;

        let vacated = self
            .queue
            .remove_from_queue(job.id, QueueEntryStatus::Reassigned)
            .await?;
        if matches!(vacated, Some(ref entry) if entry.status == QueueEntryStatus::Current) {
            self.queue
                .process_next_in_queue(from, QueueEntryStatus::Reassigned)
                .await?;
        }

        info!(job_id = %job.id, note, "No replacement candidate, job reverted to new");

        let event = JobEvent::RevertedToUnassigned {
            job_id: job.id,
            timestamp: now,
        };
        self.channel
            .broadcast_to_room(&RoomKey::Tracking(job.id), &event)
            .await;
        self.channel
            .broadcast_to_room(&RoomKey::Queue(from), &event)
            .await;

        Ok(())
    }

    /// Send the acceptance reminder and persist its cooldown anchor.
    async fn send_acceptance_reminder(
        &self,
        job: &Job,
        contractor_id: ContractorId,
    ) -> AppResult<()> {
        let now = Utc::now();
        self.notify_contractor(
            contractor_id,
            TemplateKey::ContractorReminder,
            serde_json::json!({
                "job_number": job.job_number,
                "service_type": job.service_type,
                "urgency": job.urgency,
                "customer_name": job.guest_name,
                "assigned_at": job.assigned_at,
            }),
        )
        .await;

        let patch = JobPatch {
            last_contractor_reminder_at: Some(now),
            ..JobPatch::default()
        };
        self.jobs
            .update_job(job.id, &patch, Some(JobStatus::Assigned))
            .await?;
        Ok(())
    }

    /// Best-effort contractor email; delivery failure is the sender's
    /// problem and never surfaces here.
    async fn notify_contractor(
        &self,
        contractor_id: ContractorId,
        template: TemplateKey,
        data: serde_json::Value,
    ) {
        let profile = match self.directory.get_contractor(contractor_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                warn!(contractor_id = %contractor_id, "Notify target has no profile");
                return;
            }
            Err(e) => {
                warn!(contractor_id = %contractor_id, error = %e, "Profile lookup failed");
                return;
            }
        };
        let Some(email) = profile.email else {
            debug!(contractor_id = %contractor_id, "Contractor has no email on file");
            return;
        };
        self.notifier.send_email(&email, template, data).await;
    }
}

/// Stale-timer guard: the job must still be assigned, to this contractor.
fn still_awaiting(job: &Job, contractor_id: ContractorId) -> bool {
    job.status == JobStatus::Assigned && job.contractor_id == Some(contractor_id)
}
