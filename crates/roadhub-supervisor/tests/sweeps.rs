//! Supervisor sweep behavior against persisted job state.

mod common;

use chrono::{Duration, Utc};
use roadhub_entity::job::status::JobStatus;
use roadhub_entity::queue::entry::QueueEntry;
use roadhub_entity::queue::status::QueueEntryStatus;
use roadhub_entity::traits::notifier::TemplateKey;

use common::*;

#[tokio::test]
async fn test_job_past_force_threshold_is_assigned_automatically() {
    // Scenario: a job created at T0 with no assignment by T0+10min gets
    // picked up by the sweep and assigned to the one available contractor.
    let ctx = sweep_context();
    let contractor = make_contractor("ready", true, true);
    ctx.directory.insert(contractor.clone());

    let job = aged_job(1, JobStatus::New, 12);
    ctx.jobs.insert(job.clone());

    let stats = ctx.unassigned.run_once(Utc::now()).await.expect("sweep");
    assert_eq!(stats.forced, 1);

    let stored = ctx.jobs.job(job.id);
    assert_eq!(stored.status, JobStatus::Assigned);
    assert_eq!(stored.contractor_id, Some(contractor.id));
}

#[tokio::test]
async fn test_waiting_job_triggers_customer_notice_and_admin_alert_once() {
    let ctx = sweep_context();
    // Nobody available: the job cannot be forced, only escalated.

    let job = aged_job(2, JobStatus::New, 6);
    ctx.jobs.insert(job.clone());

    let now = Utc::now();
    let stats = ctx.unassigned.run_once(now).await.expect("first pass");
    assert_eq!(stats.noticed, 1);
    assert_eq!(stats.alerted, 1);
    assert_eq!(stats.forced, 0);

    let notices = ctx.notifier.sent_with(TemplateKey::CustomerSearching);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].to, job.guest_email.clone().unwrap());
    let alerts = ctx.notifier.sent_with(TemplateKey::AdminUnassignedAlert);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].to, ctx.config.admin_email);

    // Cooldown anchors were persisted; an immediate second pass is silent.
    let stats = ctx.unassigned.run_once(now).await.expect("second pass");
    assert_eq!(stats.noticed, 0);
    assert_eq!(stats.alerted, 0);
    assert_eq!(ctx.notifier.sent_with(TemplateKey::CustomerSearching).len(), 1);
}

#[tokio::test]
async fn test_young_job_is_left_alone() {
    let ctx = sweep_context();
    let job = aged_job(3, JobStatus::New, 1);
    ctx.jobs.insert(job.clone());

    let stats = ctx.unassigned.run_once(Utc::now()).await.expect("sweep");
    assert_eq!(stats.scanned, 1);
    assert_eq!(stats.noticed + stats.alerted + stats.forced, 0);
}

#[tokio::test]
async fn test_notice_skipped_without_customer_contact() {
    let ctx = sweep_context();
    let mut job = aged_job(4, JobStatus::New, 4);
    job.guest_name = None;
    job.guest_email = None;
    job.guest_phone = None;
    ctx.jobs.insert(job.clone());

    let stats = ctx.unassigned.run_once(Utc::now()).await.expect("sweep");
    assert_eq!(stats.noticed, 0);
}

#[tokio::test]
async fn test_reminder_sweep_targets_the_window_and_persists_the_anchor() {
    let ctx = sweep_context();
    let contractor = make_contractor("slow-to-accept", true, true);
    ctx.directory.insert(contractor.clone());

    // In the window: assigned 5 minutes ago, no reaction.
    let mut overdue = aged_job(10, JobStatus::Assigned, 30);
    overdue.contractor_id = Some(contractor.id);
    overdue.assigned_at = Some(Utc::now() - Duration::minutes(5));
    ctx.jobs.insert(overdue.clone());

    // Too fresh and too old: both outside the window.
    let mut fresh = aged_job(11, JobStatus::Assigned, 30);
    fresh.contractor_id = Some(contractor.id);
    fresh.assigned_at = Some(Utc::now() - Duration::minutes(1));
    ctx.jobs.insert(fresh.clone());

    let mut ancient = aged_job(12, JobStatus::Assigned, 60);
    ancient.contractor_id = Some(contractor.id);
    ancient.assigned_at = Some(Utc::now() - Duration::minutes(40));
    ctx.jobs.insert(ancient.clone());

    let sent = ctx.reminder.run_once(Utc::now()).await.expect("sweep");
    assert_eq!(sent, 1);

    let reminders = ctx.notifier.sent_with(TemplateKey::ContractorReminder);
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].to, contractor.email.clone().unwrap());
    // Full job and customer context rides along.
    assert_eq!(reminders[0].data["job_number"], overdue.job_number);
    assert_eq!(
        reminders[0].data["customer_name"],
        overdue.guest_name.clone().unwrap()
    );

    // The persisted anchor is the source of truth.
    let stored = ctx.jobs.job(overdue.id);
    assert!(stored.last_contractor_reminder_at.is_some());

    // Same pass result on retry: nothing new.
    let sent = ctx.reminder.run_once(Utc::now()).await.expect("retry");
    assert_eq!(sent, 0);
}

#[tokio::test]
async fn test_reminder_respects_persisted_cooldown_across_restarts() {
    let ctx = sweep_context();
    let contractor = make_contractor("already-reminded", true, true);
    ctx.directory.insert(contractor.clone());

    let mut job = aged_job(13, JobStatus::Assigned, 30);
    job.contractor_id = Some(contractor.id);
    job.assigned_at = Some(Utc::now() - Duration::minutes(8));
    // A previous process instance reminded two minutes ago.
    job.last_contractor_reminder_at = Some(Utc::now() - Duration::minutes(2));
    ctx.jobs.insert(job.clone());

    // A fresh sweep (empty in-memory cache, as after a restart) still
    // honors the persisted timestamp.
    let sent = ctx.reminder.run_once(Utc::now()).await.expect("sweep");
    assert_eq!(sent, 0);
    assert!(ctx
        .notifier
        .sent_with(TemplateKey::ContractorReminder)
        .is_empty());
}

#[tokio::test]
async fn test_stale_queue_entry_moves_to_another_contractor() {
    let ctx = sweep_context();
    let stuck_with = make_contractor("stuck", true, true);
    let relief = make_contractor("relief", true, true);
    ctx.directory.insert(stuck_with.clone());
    ctx.directory.insert(relief.clone());

    let mut job = aged_job(20, JobStatus::Assigned, 200);
    job.contractor_id = Some(stuck_with.id);
    job.assigned_at = Some(Utc::now() - Duration::hours(3));
    ctx.jobs.insert(job.clone());

    // Queued behind the stuck contractor for three hours.
    let mut entry = QueueEntry::new(
        stuck_with.id,
        job.id,
        QueueEntryStatus::Queued,
        1,
        Utc::now() - Duration::hours(3),
    );
    entry.estimated_start_at = None;
    ctx.queue_store.insert(entry);

    let moved = ctx.stale_queue.run_once(Utc::now()).await.expect("sweep");
    assert_eq!(moved, 1);

    let stored = ctx.jobs.job(job.id);
    assert_eq!(stored.contractor_id, Some(relief.id));

    // The relief contractor's queue now holds the job; the old entry is
    // terminal.
    let entry = ctx.queue_store.entry_for_job(job.id).expect("new entry");
    assert_eq!(entry.contractor_id, relief.id);

    // Both sides were told.
    assert_eq!(
        ctx.notifier
            .sent_with(TemplateKey::ContractorQueueVacated)
            .len(),
        1
    );
    assert_eq!(
        ctx.notifier
            .sent_with(TemplateKey::ContractorQueueReceived)
            .len(),
        1
    );
}

#[tokio::test]
async fn test_fresh_queue_entries_are_not_touched() {
    let ctx = sweep_context();
    let contractor = make_contractor("fine", true, true);
    let other = make_contractor("other", true, true);
    ctx.directory.insert(contractor.clone());
    ctx.directory.insert(other.clone());

    let mut job = aged_job(21, JobStatus::Assigned, 30);
    job.contractor_id = Some(contractor.id);
    ctx.jobs.insert(job.clone());

    let entry = QueueEntry::new(
        contractor.id,
        job.id,
        QueueEntryStatus::Queued,
        1,
        Utc::now() - Duration::minutes(30),
    );
    ctx.queue_store.insert(entry);

    let moved = ctx.stale_queue.run_once(Utc::now()).await.expect("sweep");
    assert_eq!(moved, 0);
    assert_eq!(ctx.jobs.job(job.id).contractor_id, Some(contractor.id));
}
