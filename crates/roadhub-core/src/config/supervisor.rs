//! Periodic supervisor configuration.
//!
//! Every threshold here mirrors a persisted-timestamp check: the sweeps
//! re-derive "is this job overdue" from the job record alone, so the values
//! stay meaningful across process restarts.

use serde::{Deserialize, Serialize};

/// Configuration for the timeout and escalation supervisors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Whether the supervisors run at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Minutes a `new` job waits before the customer reassurance notice.
    #[serde(default = "default_customer_notice_after")]
    pub customer_notice_after_minutes: i64,
    /// Cooldown between customer reassurance notices, in minutes.
    #[serde(default = "default_customer_notice_cooldown")]
    pub customer_notice_cooldown_minutes: i64,
    /// Minutes a `new` job waits before the admin alert.
    #[serde(default = "default_admin_alert_after")]
    pub admin_alert_after_minutes: i64,
    /// Cooldown between admin alerts, in minutes.
    #[serde(default = "default_admin_alert_cooldown")]
    pub admin_alert_cooldown_minutes: i64,
    /// Minutes a `new` job waits before assignment is forced.
    #[serde(default = "default_force_assign_after")]
    pub force_assign_after_minutes: i64,
    /// Email address that receives admin alerts.
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    /// Window of job age (minutes) the reminder sweep considers.
    #[serde(default = "default_reminder_min_age")]
    pub reminder_min_age_minutes: i64,
    /// Upper bound of job age (minutes) the reminder sweep considers.
    #[serde(default = "default_reminder_max_age")]
    pub reminder_max_age_minutes: i64,
    /// TTL of the in-process reminder de-dup cache, in minutes.
    #[serde(default = "default_reminder_dedup_ttl")]
    pub reminder_dedup_ttl_minutes: u64,
    /// Hours a queued entry may dwell without progress before reassignment.
    #[serde(default = "default_stale_queue_dwell")]
    pub stale_queue_dwell_hours: i64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            customer_notice_after_minutes: default_customer_notice_after(),
            customer_notice_cooldown_minutes: default_customer_notice_cooldown(),
            admin_alert_after_minutes: default_admin_alert_after(),
            admin_alert_cooldown_minutes: default_admin_alert_cooldown(),
            force_assign_after_minutes: default_force_assign_after(),
            admin_email: default_admin_email(),
            reminder_min_age_minutes: default_reminder_min_age(),
            reminder_max_age_minutes: default_reminder_max_age(),
            reminder_dedup_ttl_minutes: default_reminder_dedup_ttl(),
            stale_queue_dwell_hours: default_stale_queue_dwell(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_customer_notice_after() -> i64 {
    3
}

fn default_customer_notice_cooldown() -> i64 {
    30
}

fn default_admin_alert_after() -> i64 {
    5
}

fn default_admin_alert_cooldown() -> i64 {
    60
}

fn default_force_assign_after() -> i64 {
    10
}

fn default_admin_email() -> String {
    "dispatch-ops@roadhub.local".to_string()
}

fn default_reminder_min_age() -> i64 {
    3
}

fn default_reminder_max_age() -> i64 {
    15
}

fn default_reminder_dedup_ttl() -> u64 {
    10
}

fn default_stale_queue_dwell() -> i64 {
    2
}
