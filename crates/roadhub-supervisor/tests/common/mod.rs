//! In-memory fakes and wiring for supervisor sweep tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use roadhub_core::config::dispatch::DispatchConfig;
use roadhub_core::config::supervisor::SupervisorConfig;
use roadhub_core::result::AppResult;
use roadhub_core::types::geo::GeoPoint;
use roadhub_core::types::id::{ContractorId, JobId, QueueEntryId};
use roadhub_entity::contractor::profile::ContractorProfile;
use roadhub_entity::contractor::schedule::WeeklySchedule;
use roadhub_entity::contractor::vacation::VacationRequest;
use roadhub_entity::events::{JobEvent, RoomKey};
use roadhub_entity::job::filter::{JobFilter, JobPatch};
use roadhub_entity::job::history::JobStatusHistory;
use roadhub_entity::job::model::{CreateJob, Job};
use roadhub_entity::job::status::JobStatus;
use roadhub_entity::queue::entry::{QueueDepth, QueueEntry, QueueNotice};
use roadhub_entity::queue::status::QueueEntryStatus;
use roadhub_entity::traits::channel::RealtimeChannel;
use roadhub_entity::traits::directory::ContractorDirectory;
use roadhub_entity::traits::notifier::{NotificationSender, TemplateKey};
use roadhub_entity::traits::scoring::{AssignmentScore, ScoringStrategy};
use roadhub_entity::traits::store::{JobStore, QueueStore};

use roadhub_dispatch::assignment::{AssignmentSelector, AssignmentService};
use roadhub_dispatch::availability::AvailabilityService;
use roadhub_dispatch::queue::QueueManager;
use roadhub_dispatch::timer::AcceptanceTimerRegistry;
use roadhub_dispatch::DispatchEngine;

use roadhub_supervisor::sweeps::{ReminderSweep, StaleQueueSweep, UnassignedJobMonitor};

/// In-memory job store mirroring the repository's patch semantics.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<JobId, Job>>,
    history: Mutex<Vec<JobStatusHistory>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: Job) {
        self.jobs.lock().unwrap().insert(job.id, job);
    }

    pub fn job(&self, id: JobId) -> Job {
        self.jobs.lock().unwrap().get(&id).expect("job exists").clone()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get_job(&self, id: JobId) -> AppResult<Option<Job>> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn find_jobs(&self, filter: &JobFilter) -> AppResult<Vec<Job>> {
        let jobs = self.jobs.lock().unwrap();
        let mut matched: Vec<Job> = jobs
            .values()
            .filter(|job| {
                (filter.statuses.is_empty() || filter.statuses.contains(&job.status))
                    && filter
                        .contractor_id
                        .map_or(true, |c| job.contractor_id == Some(c))
                    && filter.created_before.map_or(true, |at| job.created_at < at)
                    && filter.created_after.map_or(true, |at| job.created_at >= at)
                    && filter
                        .assigned_before
                        .map_or(true, |at| job.assigned_at.is_some_and(|a| a < at))
                    && filter
                        .assigned_after
                        .map_or(true, |at| job.assigned_at.is_some_and(|a| a >= at))
            })
            .cloned()
            .collect();
        matched.sort_by_key(|job| job.created_at);
        if let Some(limit) = filter.limit {
            matched.truncate(limit as usize);
        }
        Ok(matched)
    }

    async fn create_job(&self, _data: &CreateJob) -> AppResult<Job> {
        unimplemented!("supervisor tests insert jobs directly")
    }

    async fn update_job(
        &self,
        id: JobId,
        patch: &JobPatch,
        expected_prior: Option<JobStatus>,
    ) -> AppResult<bool> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(expected) = expected_prior {
            if job.status != expected {
                return Ok(false);
            }
        }
        if let Some(status) = patch.status {
            job.status = status;
        }
        if let Some(contractor_id) = patch.contractor_id {
            job.contractor_id = contractor_id;
        }
        if let Some(assigned_at) = patch.assigned_at {
            job.assigned_at = assigned_at;
        }
        if let Some(at) = patch.accepted_at {
            job.accepted_at = Some(at);
        }
        if let Some(at) = patch.completed_at {
            job.completed_at = Some(at);
        }
        if let Some(method) = patch.assignment_method {
            job.assignment_method = Some(method);
        }
        if let Some(auto) = patch.auto_assigned {
            job.auto_assigned = auto;
        }
        if patch.increment_attempts {
            job.assignment_attempts += 1;
        }
        if let Some(at) = patch.last_admin_alert_at {
            job.last_admin_alert_at = Some(at);
        }
        if let Some(at) = patch.last_customer_notice_at {
            job.last_customer_notice_at = Some(at);
        }
        if let Some(at) = patch.last_contractor_reminder_at {
            job.last_contractor_reminder_at = Some(at);
        }
        job.updated_at = Utc::now();
        Ok(true)
    }

    async fn add_status_history(&self, entry: &JobStatusHistory) -> AppResult<()> {
        self.history.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn count_jobs_today(
        &self,
        contractor_id: ContractorId,
        now: DateTime<Utc>,
    ) -> AppResult<i64> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs
            .values()
            .filter(|job| {
                job.contractor_id == Some(contractor_id)
                    && job.status.counts_toward_daily_cap()
                    && job.created_at.date_naive() == now.date_naive()
            })
            .count() as i64)
    }
}

/// In-memory queue store.
#[derive(Debug, Default)]
pub struct MemoryQueueStore {
    entries: Mutex<HashMap<QueueEntryId, QueueEntry>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, entry: QueueEntry) {
        self.entries.lock().unwrap().insert(entry.id, entry);
    }

    pub fn entry_for_job(&self, job_id: JobId) -> Option<QueueEntry> {
        self.entries
            .lock()
            .unwrap()
            .values()
            .find(|e| e.job_id == job_id && e.status.is_active())
            .cloned()
    }

    fn active_sorted(&self, contractor_id: ContractorId) -> Vec<QueueEntry> {
        let mut active: Vec<QueueEntry> = self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.contractor_id == contractor_id && e.status.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|e| e.position);
        active
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn active_entries(&self, contractor_id: ContractorId) -> AppResult<Vec<QueueEntry>> {
        Ok(self.active_sorted(contractor_id))
    }

    async fn current_entry(&self, contractor_id: ContractorId) -> AppResult<Option<QueueEntry>> {
        Ok(self
            .active_sorted(contractor_id)
            .into_iter()
            .find(|e| e.status == QueueEntryStatus::Current))
    }

    async fn active_entry_for_job(&self, job_id: JobId) -> AppResult<Option<QueueEntry>> {
        Ok(self.entry_for_job(job_id))
    }

    async fn insert_entry(&self, entry: &QueueEntry) -> AppResult<()> {
        self.insert(entry.clone());
        Ok(())
    }

    async fn update_entry_status(
        &self,
        id: QueueEntryId,
        next: QueueEntryStatus,
        expected_prior: QueueEntryStatus,
    ) -> AppResult<bool> {
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries.get_mut(&id) else {
            return Ok(false);
        };
        if entry.status != expected_prior {
            return Ok(false);
        }
        entry.status = next;
        Ok(true)
    }

    async fn set_position(&self, id: QueueEntryId, position: i32) -> AppResult<()> {
        if let Some(entry) = self.entries.lock().unwrap().get_mut(&id) {
            entry.position = position;
        }
        Ok(())
    }

    async fn set_estimated_start(
        &self,
        id: QueueEntryId,
        at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        if let Some(entry) = self.entries.lock().unwrap().get_mut(&id) {
            entry.estimated_start_at = at;
        }
        Ok(())
    }

    async fn append_notice(&self, id: QueueEntryId, notice: &QueueNotice) -> AppResult<()> {
        if let Some(entry) = self.entries.lock().unwrap().get_mut(&id) {
            entry.notifications_sent.0.push(notice.clone());
        }
        Ok(())
    }

    async fn stale_queued_entries(
        &self,
        queued_before: DateTime<Utc>,
    ) -> AppResult<Vec<QueueEntry>> {
        let mut stale: Vec<QueueEntry> = self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.status == QueueEntryStatus::Queued && e.queued_at < queued_before)
            .cloned()
            .collect();
        stale.sort_by_key(|e| e.queued_at);
        Ok(stale)
    }

    async fn queue_depths(&self) -> AppResult<Vec<QueueDepth>> {
        let entries = self.entries.lock().unwrap();
        let mut depths: HashMap<ContractorId, QueueDepth> = HashMap::new();
        for entry in entries.values().filter(|e| e.status.is_active()) {
            let depth = depths
                .entry(entry.contractor_id)
                .or_insert_with(|| QueueDepth {
                    contractor_id: entry.contractor_id,
                    depth: 0,
                    oldest_queued_at: None,
                });
            depth.depth += 1;
            if entry.status == QueueEntryStatus::Queued {
                depth.oldest_queued_at = match depth.oldest_queued_at {
                    Some(at) if at <= entry.queued_at => Some(at),
                    _ => Some(entry.queued_at),
                };
            }
        }
        Ok(depths.into_values().collect())
    }
}

/// In-memory contractor directory.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    contractors: Mutex<HashMap<ContractorId, ContractorProfile>>,
    order: Mutex<Vec<ContractorId>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: ContractorProfile) {
        self.order.lock().unwrap().push(profile.id);
        self.contractors.lock().unwrap().insert(profile.id, profile);
    }
}

#[async_trait]
impl ContractorDirectory for MemoryDirectory {
    async fn get_contractor(&self, id: ContractorId) -> AppResult<Option<ContractorProfile>> {
        Ok(self.contractors.lock().unwrap().get(&id).cloned())
    }

    async fn approved_vacations(&self, _id: ContractorId) -> AppResult<Vec<VacationRequest>> {
        Ok(Vec::new())
    }

    async fn available_for_assignment(
        &self,
        _near: Option<GeoPoint>,
    ) -> AppResult<Vec<ContractorProfile>> {
        let contractors = self.contractors.lock().unwrap();
        let order = self.order.lock().unwrap();
        Ok(order
            .iter()
            .filter_map(|id| contractors.get(id))
            .filter(|c| c.online && c.available)
            .cloned()
            .collect())
    }
}

/// Recorded email.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub template: TemplateKey,
    pub data: serde_json::Value,
}

/// Recording notification sender.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_with(&self, template: TemplateKey) -> Vec<SentEmail> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.template == template)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send_email(&self, to: &str, template: TemplateKey, data: serde_json::Value) -> bool {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            template,
            data,
        });
        true
    }
}

/// Channel that drops everything (fan-out is covered elsewhere).
#[derive(Debug, Default)]
pub struct NullChannel;

#[async_trait]
impl RealtimeChannel for NullChannel {
    async fn broadcast_to_room(&self, _room: &RoomKey, _event: &JobEvent) {}
    async fn send_to_user(&self, _user_id: Uuid, _event: &JobEvent) {}
}

/// Scoring strategy with nothing to say.
#[derive(Debug, Default)]
pub struct NoScoring;

#[async_trait]
impl ScoringStrategy for NoScoring {
    async fn ranked_scores(&self, _job: &Job) -> AppResult<Vec<AssignmentScore>> {
        Ok(Vec::new())
    }
}

/// Wiring for the sweeps under test.
pub struct SweepContext {
    pub jobs: Arc<MemoryJobStore>,
    pub queue_store: Arc<MemoryQueueStore>,
    pub directory: Arc<MemoryDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub engine: Arc<DispatchEngine>,
    pub unassigned: UnassignedJobMonitor,
    pub reminder: ReminderSweep,
    pub stale_queue: StaleQueueSweep,
    pub config: SupervisorConfig,
}

pub fn sweep_context() -> SweepContext {
    let config = SupervisorConfig::default();
    let dispatch_config = DispatchConfig::default();

    let jobs = Arc::new(MemoryJobStore::new());
    let queue_store = Arc::new(MemoryQueueStore::new());
    let directory = Arc::new(MemoryDirectory::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let jobs_dyn: Arc<dyn JobStore> = jobs.clone();
    let queue_dyn: Arc<dyn QueueStore> = queue_store.clone();
    let directory_dyn: Arc<dyn ContractorDirectory> = directory.clone();
    let notifier_dyn: Arc<dyn NotificationSender> = notifier.clone();
    let channel_dyn: Arc<dyn RealtimeChannel> = Arc::new(NullChannel);
    let scoring_dyn: Arc<dyn ScoringStrategy> = Arc::new(NoScoring);

    let availability = AvailabilityService::new(directory_dyn.clone(), jobs_dyn.clone());
    let selector = AssignmentSelector::new(
        scoring_dyn,
        directory_dyn.clone(),
        availability.clone(),
        dispatch_config.clone(),
    );
    let manager = QueueManager::new(
        queue_dyn.clone(),
        jobs_dyn.clone(),
        notifier_dyn.clone(),
        channel_dyn.clone(),
    );
    let service = Arc::new(AssignmentService::new(
        jobs_dyn.clone(),
        queue_dyn.clone(),
        directory_dyn.clone(),
        notifier_dyn.clone(),
        channel_dyn.clone(),
        selector,
        availability,
        manager,
        dispatch_config.clone(),
    ));
    let timers = AcceptanceTimerRegistry::new(StdDuration::from_secs(
        dispatch_config.acceptance_window_seconds,
    ));
    let engine = Arc::new(DispatchEngine::new(
        jobs_dyn.clone(),
        queue_dyn.clone(),
        channel_dyn,
        service,
        timers,
    ));

    let unassigned = UnassignedJobMonitor::new(
        jobs_dyn.clone(),
        engine.clone(),
        notifier_dyn.clone(),
        config.clone(),
    );
    let reminder = ReminderSweep::new(
        jobs_dyn.clone(),
        directory_dyn,
        notifier_dyn,
        config.clone(),
    );
    let stale_queue = StaleQueueSweep::new(queue_dyn, engine.clone(), config.clone());

    SweepContext {
        jobs,
        queue_store,
        directory,
        notifier,
        engine,
        unassigned,
        reminder,
        stale_queue,
        config,
    }
}

/// A contractor with the given flags.
pub fn make_contractor(name: &str, online: bool, available: bool) -> ContractorProfile {
    let now = Utc::now();
    ContractorProfile {
        id: ContractorId::new(),
        display_name: name.to_string(),
        email: Some(format!("{name}@contractors.test")),
        phone: None,
        online,
        available,
        max_jobs_per_day: None,
        working_hours: Json(WeeklySchedule::default()),
        base_lat: None,
        base_lng: None,
        created_at: now,
        updated_at: now,
    }
}

/// A job created `age_minutes` ago, in the given status.
pub fn aged_job(number: u32, status: JobStatus, age_minutes: i64) -> Job {
    let created = Utc::now() - chrono::Duration::minutes(age_minutes);
    Job {
        id: JobId::new(),
        job_number: format!("RH-SWEEP-{number:04}"),
        status,
        urgency: 3,
        service_type: "flat_tire".to_string(),
        estimated_duration_minutes: 45,
        contractor_id: None,
        assigned_at: None,
        accepted_at: None,
        completed_at: None,
        assignment_method: None,
        auto_assigned: false,
        assignment_attempts: 0,
        last_admin_alert_at: None,
        last_customer_notice_at: None,
        last_contractor_reminder_at: None,
        customer_id: None,
        guest_name: Some("Jamie Guest".to_string()),
        guest_email: Some("jamie@customers.test".to_string()),
        guest_phone: None,
        location_lat: None,
        location_lng: None,
        route_id: None,
        created_at: created,
        updated_at: created,
    }
}
