//! Unassigned-job monitor.
//!
//! Walks jobs still in `new` and climbs the escalation ladder by wait time:
//! customer reassurance notice, admin alert, forced assignment. The
//! cooldown anchors live on the job record, so the ladder holds its shape
//! across restarts and across multiple engine instances.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use roadhub_core::config::supervisor::SupervisorConfig;
use roadhub_core::result::AppResult;
use roadhub_dispatch::DispatchEngine;
use roadhub_entity::job::filter::{JobFilter, JobPatch};
use roadhub_entity::job::model::Job;
use roadhub_entity::job::status::JobStatus;
use roadhub_entity::traits::notifier::{NotificationSender, TemplateKey};
use roadhub_entity::traits::store::JobStore;

/// What a single pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UnassignedSweepStats {
    /// Jobs examined.
    pub scanned: u32,
    /// Customer reassurance notices sent.
    pub noticed: u32,
    /// Admin alerts sent.
    pub alerted: u32,
    /// Assignments forced.
    pub forced: u32,
}

/// Periodic monitor for jobs stuck in `new`.
#[derive(Debug)]
pub struct UnassignedJobMonitor {
    jobs: Arc<dyn JobStore>,
    engine: Arc<DispatchEngine>,
    notifier: Arc<dyn NotificationSender>,
    config: SupervisorConfig,
    running: Mutex<()>,
}

impl UnassignedJobMonitor {
    /// Create a new monitor.
    pub fn new(
        jobs: Arc<dyn JobStore>,
        engine: Arc<DispatchEngine>,
        notifier: Arc<dyn NotificationSender>,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            jobs,
            engine,
            notifier,
            config,
            running: Mutex::new(()),
        }
    }

    /// Scheduler entry point. A run still in progress when the next tick
    /// fires is skipped, never queued.
    pub async fn run(&self) {
        let Ok(_guard) = self.running.try_lock() else {
            debug!("Unassigned monitor still running, skipping tick");
            return;
        };
        match self.run_once(Utc::now()).await {
            Ok(stats) if stats.noticed + stats.alerted + stats.forced > 0 => {
                info!(
                    scanned = stats.scanned,
                    noticed = stats.noticed,
                    alerted = stats.alerted,
                    forced = stats.forced,
                    "Unassigned monitor pass complete"
                );
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "Unassigned monitor pass failed"),
        }
    }

    /// One full pass at the given instant.
    pub async fn run_once(&self, now: DateTime<Utc>) -> AppResult<UnassignedSweepStats> {
        let jobs = self
            .jobs
            .find_jobs(&JobFilter::with_status(JobStatus::New))
            .await?;

        let mut stats = UnassignedSweepStats {
            scanned: jobs.len() as u32,
            ..Default::default()
        };
        for job in jobs {
            if let Err(e) = self.escalate(&job, now, &mut stats).await {
                error!(job_id = %job.id, error = %e, "Escalation failed, continuing sweep");
            }
        }
        Ok(stats)
    }

    /// Climb the ladder for one job.
    async fn escalate(
        &self,
        job: &Job,
        now: DateTime<Utc>,
        stats: &mut UnassignedSweepStats,
    ) -> AppResult<()> {
        let age = job.age_minutes(now);

        if age >= self.config.force_assign_after_minutes {
            let outcome = self.engine.auto_assign_job(job.id).await?;
            if outcome.success {
                stats.forced += 1;
                return Ok(());
            }
            // No candidate yet; keep the customer and admins in the loop.
        }

        if age >= self.config.admin_alert_after_minutes
            && cooldown_elapsed(
                job.last_admin_alert_at,
                self.config.admin_alert_cooldown_minutes,
                now,
            )
        {
            self.notifier
                .send_email(
                    &self.config.admin_email,
                    TemplateKey::AdminUnassignedAlert,
                    serde_json::json!({
                        "job_number": job.job_number,
                        "service_type": job.service_type,
                        "urgency": job.urgency,
                        "waiting_minutes": age,
                        "attempts": job.assignment_attempts,
                    }),
                )
                .await;
            let patch = JobPatch {
                last_admin_alert_at: Some(now),
                ..JobPatch::default()
            };
            self.jobs
                .update_job(job.id, &patch, Some(JobStatus::New))
                .await?;
            stats.alerted += 1;
        }

        if age >= self.config.customer_notice_after_minutes
            && job.has_customer_contact()
            && cooldown_elapsed(
                job.last_customer_notice_at,
                self.config.customer_notice_cooldown_minutes,
                now,
            )
        {
            if let Some(email) = job.customer_email() {
                self.notifier
                    .send_email(
                        email,
                        TemplateKey::CustomerSearching,
                        serde_json::json!({
                            "job_number": job.job_number,
                            "waiting_minutes": age,
                        }),
                    )
                    .await;
            }
            let patch = JobPatch {
                last_customer_notice_at: Some(now),
                ..JobPatch::default()
            };
            self.jobs
                .update_job(job.id, &patch, Some(JobStatus::New))
                .await?;
            stats.noticed += 1;
        }

        Ok(())
    }
}

/// Whether enough time has passed since the last anchor.
fn cooldown_elapsed(last: Option<DateTime<Utc>>, cooldown_minutes: i64, now: DateTime<Utc>) -> bool {
    last.map_or(true, |at| now - at >= Duration::minutes(cooldown_minutes))
}
