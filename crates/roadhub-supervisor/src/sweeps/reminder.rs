//! Acceptance reminder sweep.
//!
//! The crash-recovery net behind the per-job acceptance timers: scans
//! `assigned` jobs three to fifteen minutes old and reminds contractors who
//! have not reacted. The moka cache only avoids redundant checks within a
//! process; the persisted `last_contractor_reminder_at` timestamp is the
//! source of truth, so restarts and multiple instances stay correct.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use moka::future::Cache;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use roadhub_core::config::supervisor::SupervisorConfig;
use roadhub_core::result::AppResult;
use roadhub_entity::job::filter::{JobFilter, JobPatch};
use roadhub_entity::job::model::Job;
use roadhub_entity::job::status::JobStatus;
use roadhub_entity::traits::directory::ContractorDirectory;
use roadhub_entity::traits::notifier::{NotificationSender, TemplateKey};
use roadhub_entity::traits::store::JobStore;

/// Periodic reminder sweep over `assigned` jobs.
#[derive(Debug)]
pub struct ReminderSweep {
    jobs: Arc<dyn JobStore>,
    directory: Arc<dyn ContractorDirectory>,
    notifier: Arc<dyn NotificationSender>,
    config: SupervisorConfig,
    dedup: Cache<String, ()>,
    running: Mutex<()>,
}

impl ReminderSweep {
    /// Create a new reminder sweep.
    pub fn new(
        jobs: Arc<dyn JobStore>,
        directory: Arc<dyn ContractorDirectory>,
        notifier: Arc<dyn NotificationSender>,
        config: SupervisorConfig,
    ) -> Self {
        let dedup = Cache::builder()
            .time_to_live(StdDuration::from_secs(
                config.reminder_dedup_ttl_minutes * 60,
            ))
            .max_capacity(10_000)
            .build();
        Self {
            jobs,
            directory,
            notifier,
            config,
            dedup,
            running: Mutex::new(()),
        }
    }

    /// Scheduler entry point with the overlap guard.
    pub async fn run(&self) {
        let Ok(_guard) = self.running.try_lock() else {
            debug!("Reminder sweep still running, skipping tick");
            return;
        };
        match self.run_once(Utc::now()).await {
            Ok(sent) if sent > 0 => info!(sent, "Reminder sweep pass complete"),
            Ok(_) => {}
            Err(e) => error!(error = %e, "Reminder sweep pass failed"),
        }
    }

    /// One full pass at the given instant. Returns how many reminders went
    /// out.
    pub async fn run_once(&self, now: DateTime<Utc>) -> AppResult<u32> {
        let filter = JobFilter::with_status(JobStatus::Assigned).assigned_between(
            now - Duration::minutes(self.config.reminder_max_age_minutes),
            now - Duration::minutes(self.config.reminder_min_age_minutes),
        );
        let jobs = self.jobs.find_jobs(&filter).await?;

        let mut sent = 0;
        for job in jobs {
            match self.remind(&job, now).await {
                Ok(true) => sent += 1,
                Ok(false) => {}
                Err(e) => {
                    error!(job_id = %job.id, error = %e, "Reminder failed, continuing sweep");
                }
            }
        }
        Ok(sent)
    }

    /// Remind one contractor, if neither the cache nor the persisted
    /// timestamp says it already happened recently.
    async fn remind(&self, job: &Job, now: DateTime<Utc>) -> AppResult<bool> {
        let Some(contractor_id) = job.contractor_id else {
            return Ok(false);
        };
        let key = format!("{}:{}", job.id, contractor_id);
        if self.dedup.get(&key).await.is_some() {
            return Ok(false);
        }

        let ttl = Duration::minutes(self.config.reminder_dedup_ttl_minutes as i64);
        if let Some(at) = job.last_contractor_reminder_at {
            if now - at < ttl {
                self.dedup.insert(key, ()).await;
                return Ok(false);
            }
        }

        let Some(profile) = self.directory.get_contractor(contractor_id).await? else {
            return Ok(false);
        };
        let Some(email) = profile.email else {
            debug!(contractor_id = %contractor_id, "No email for reminder");
            return Ok(false);
        };

        self.notifier
            .send_email(
                &email,
                TemplateKey::ContractorReminder,
                serde_json::json!({
                    "job_number": job.job_number,
                    "service_type": job.service_type,
                    "urgency": job.urgency,
                    "customer_name": job.guest_name,
                    "customer_phone": job.guest_phone,
                    "location": job.location(),
                    "assigned_at": job.assigned_at,
                    "waiting_minutes": job.assigned_age_minutes(now),
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
        self.dedup.insert(key, ()).await;
        Ok(true)
    }
}
