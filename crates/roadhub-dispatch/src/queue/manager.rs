//! Contractor queue manager.
//!
//! Maintains the ordered, per-contractor list of assigned jobs: one
//! `current` job (position 0) plus `queued` jobs at dense 1-based
//! positions. Queue state changes commit first; notifications and
//! real-time events are fire-and-forget and never roll the queue back.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use roadhub_core::result::AppResult;
use roadhub_core::types::id::{ContractorId, JobId};
use roadhub_entity::events::{JobEvent, RoomKey};
use roadhub_entity::job::model::Job;
use roadhub_entity::queue::entry::{QueueEntry, QueueNotice};
use roadhub_entity::queue::status::QueueEntryStatus;
use roadhub_entity::traits::channel::RealtimeChannel;
use roadhub_entity::traits::notifier::{NotificationSender, TemplateKey};
use roadhub_entity::traits::store::{JobStore, QueueStore};

/// Queue orchestration over the queue store.
#[derive(Debug, Clone)]
pub struct QueueManager {
    store: Arc<dyn QueueStore>,
    jobs: Arc<dyn JobStore>,
    notifier: Arc<dyn NotificationSender>,
    channel: Arc<dyn RealtimeChannel>,
}

impl QueueManager {
    /// Create a new queue manager.
    pub fn new(
        store: Arc<dyn QueueStore>,
        jobs: Arc<dyn JobStore>,
        notifier: Arc<dyn NotificationSender>,
        channel: Arc<dyn RealtimeChannel>,
    ) -> Self {
        Self {
            store,
            jobs,
            notifier,
            channel,
        }
    }

    /// Add a job to a contractor's queue.
    ///
    /// An empty queue promotes the job straight to `current`; otherwise the
    /// job is appended at the tail. Re-adding a job already held in a queue
    /// returns the existing entry (at-least-once callers are expected).
    pub async fn add_to_queue(&self, contractor_id: ContractorId, job: &Job) -> AppResult<QueueEntry> {
        if let Some(existing) = self.store.active_entry_for_job(job.id).await? {
            debug!(
                job_id = %job.id,
                contractor_id = %existing.contractor_id,
                "Job already queued, skipping add"
            );
            return Ok(existing);
        }

        let now = Utc::now();
        let active = self.store.active_entries(contractor_id).await?;
        let (status, position) = if active.is_empty() {
            (QueueEntryStatus::Current, 0)
        } else {
            let tail = active
                .iter()
                .filter(|e| e.status == QueueEntryStatus::Queued)
                .map(|e| e.position)
                .max()
                .unwrap_or(0);
            (QueueEntryStatus::Queued, tail + 1)
        };

        let entry = QueueEntry::new(contractor_id, job.id, status, position, now);
        self.store.insert_entry(&entry).await?;
        self.update_estimates(contractor_id).await?;

        debug!(
            job_id = %job.id,
            contractor_id = %contractor_id,
            position,
            status = %status,
            "Job added to queue"
        );

        let event = JobEvent::QueuePosition {
            job_id: job.id,
            contractor_id,
            position,
            estimated_start_at: None,
            timestamp: now,
        };
        self.channel
            .broadcast_to_room(&RoomKey::Tracking(job.id), &event)
            .await;
        self.channel
            .broadcast_to_room(&RoomKey::Queue(contractor_id), &event)
            .await;

        if status == QueueEntryStatus::Queued {
            self.notify_customer_position(&entry, job, position).await;
        }

        Ok(entry)
    }

    /// Advance a contractor's queue after the current job finished.
    ///
    /// Marks the current entry with `terminal` (`completed` on completion,
    /// `expired`/`reassigned` when evicted), promotes the earliest `queued`
    /// entry to `current`, recomputes the remaining positions, and returns
    /// the promoted job (or `None` if the queue is now empty).
    pub async fn process_next_in_queue(
        &self,
        contractor_id: ContractorId,
        terminal: QueueEntryStatus,
    ) -> AppResult<Option<Job>> {
        let now = Utc::now();

        if let Some(current) = self.store.current_entry(contractor_id).await? {
            // A stale precondition means another invocation already
            // advanced this queue; fall through and re-read.
            self.store
                .update_entry_status(current.id, terminal, QueueEntryStatus::Current)
                .await?;
        }

        let queued = self.queued_entries(contractor_id).await?;
        let Some(head) = queued.first() else {
            self.channel
                .broadcast_to_room(
                    &RoomKey::Queue(contractor_id),
                    &JobEvent::QueueAdvanced {
                        contractor_id,
                        promoted_job_id: None,
                        timestamp: now,
                    },
                )
                .await;
            return Ok(None);
        };

        let promoted = self
            .store
            .update_entry_status(head.id, QueueEntryStatus::Current, QueueEntryStatus::Queued)
            .await?;
        if !promoted {
            debug!(
                contractor_id = %contractor_id,
                job_id = %head.job_id,
                "Queue already advanced by a concurrent run"
            );
            return Ok(None);
        }
        self.store.set_position(head.id, 0).await?;

        for (index, entry) in queued.iter().skip(1).enumerate() {
            let position = (index + 1) as i32;
            if entry.position != position {
                self.store.set_position(entry.id, position).await?;
            }
        }

        self.update_estimates(contractor_id).await?;

        let event = JobEvent::QueueAdvanced {
            contractor_id,
            promoted_job_id: Some(head.job_id),
            timestamp: now,
        };
        self.channel
            .broadcast_to_room(&RoomKey::Queue(contractor_id), &event)
            .await;
        self.channel
            .broadcast_to_room(&RoomKey::Tracking(head.job_id), &event)
            .await;

        self.jobs.get_job(head.job_id).await
    }

    /// Pull a job out of whichever queue holds it, marking the entry with
    /// `terminal` and compacting the remaining positions.
    ///
    /// Returns the vacated entry so the caller can decide whether the
    /// queue needs advancing (the entry was `current`) or not.
    pub async fn remove_from_queue(
        &self,
        job_id: JobId,
        terminal: QueueEntryStatus,
    ) -> AppResult<Option<QueueEntry>> {
        let Some(entry) = self.store.active_entry_for_job(job_id).await? else {
            return Ok(None);
        };

        let updated = self
            .store
            .update_entry_status(entry.id, terminal, entry.status)
            .await?;
        if !updated {
            debug!(job_id = %job_id, "Queue entry already transitioned, skipping removal");
            return Ok(None);
        }

        self.compact_positions(entry.contractor_id).await?;
        self.update_estimates(entry.contractor_id).await?;

        debug!(
            job_id = %job_id,
            contractor_id = %entry.contractor_id,
            terminal = %terminal,
            "Job removed from queue"
        );
        Ok(Some(entry))
    }

    /// Recompute every queued entry's estimated start time.
    ///
    /// FIFO-additive model: the estimate for a queued entry is now plus the
    /// current job's full estimated duration plus the durations of every
    /// queued job ahead of it. Live progress on the current job is not
    /// factored in; this is a documented approximation, not an ETA
    /// contract.
    pub async fn update_estimates(&self, contractor_id: ContractorId) -> AppResult<()> {
        let now = Utc::now();
        let active = self.store.active_entries(contractor_id).await?;

        let mut offset = Duration::zero();
        for entry in active {
            let Some(job) = self.jobs.get_job(entry.job_id).await? else {
                continue;
            };
            let duration = Duration::minutes(i64::from(job.estimated_duration_minutes));

            if entry.status == QueueEntryStatus::Current {
                offset += duration;
                continue;
            }

            let estimate = now + offset;
            if entry.estimated_start_at != Some(estimate) {
                self.store
                    .set_estimated_start(entry.id, Some(estimate))
                    .await?;
            }
            offset += duration;
        }

        Ok(())
    }

    /// Active `queued` entries in position order.
    async fn queued_entries(&self, contractor_id: ContractorId) -> AppResult<Vec<QueueEntry>> {
        let active = self.store.active_entries(contractor_id).await?;
        Ok(active
            .into_iter()
            .filter(|e| e.status == QueueEntryStatus::Queued)
            .collect())
    }

    /// Re-number queued entries to dense positions `1..=N`, pushing a
    /// position event for every entry that moved.
    async fn compact_positions(&self, contractor_id: ContractorId) -> AppResult<()> {
        let now = Utc::now();
        let queued = self.queued_entries(contractor_id).await?;

        for (index, entry) in queued.iter().enumerate() {
            let position = (index + 1) as i32;
            if entry.position == position {
                continue;
            }
            self.store.set_position(entry.id, position).await?;

            let event = JobEvent::QueuePosition {
                job_id: entry.job_id,
                contractor_id,
                position,
                estimated_start_at: entry.estimated_start_at,
                timestamp: now,
            };
            self.channel
                .broadcast_to_room(&RoomKey::Tracking(entry.job_id), &event)
                .await;
            self.channel
                .broadcast_to_room(&RoomKey::Queue(contractor_id), &event)
                .await;
        }

        Ok(())
    }

    /// Best-effort customer notice about their queue position. Failure is
    /// logged and recorded nowhere else; the queue state stands regardless.
    async fn notify_customer_position(&self, entry: &QueueEntry, job: &Job, position: i32) {
        let Some(email) = job.customer_email() else {
            return;
        };

        let delivered = self
            .notifier
            .send_email(
                email,
                TemplateKey::CustomerQueuePosition,
                serde_json::json!({
                    "job_number": job.job_number,
                    "position": position,
                }),
            )
            .await;
        if !delivered {
            warn!(job_id = %job.id, "Customer queue-position notice not delivered");
        }

        let notice = QueueNotice {
            kind: TemplateKey::CustomerQueuePosition.as_str().to_string(),
            sent_at: Utc::now(),
        };
        if let Err(e) = self.store.append_notice(entry.id, &notice).await {
            warn!(job_id = %job.id, error = %e, "Failed to record queue notice");
        }
    }
}
