//! Job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use roadhub_core::types::geo::GeoPoint;
use roadhub_core::types::id::{ContractorId, CustomerId, JobId, RouteId};

use super::status::{AssignmentMethod, JobStatus};

/// A service job tracked through the assignment/acceptance/completion
/// lifecycle. Jobs are never deleted; terminal jobs are retained for audit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Unique job identifier.
    pub id: JobId,
    /// Human-readable job number (e.g., `"RH-20260805-0412"`).
    pub job_number: String,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// Urgency level, 1 (routine) to 5 (emergency).
    pub urgency: i16,
    /// Requested service type identifier.
    pub service_type: String,
    /// Estimated work duration in minutes, used for queue start estimates.
    pub estimated_duration_minutes: i32,
    /// The currently assigned contractor, if any. At most one at a time.
    pub contractor_id: Option<ContractorId>,
    /// When the current assignment was made.
    pub assigned_at: Option<DateTime<Utc>>,
    /// When the assigned contractor accepted.
    pub accepted_at: Option<DateTime<Utc>>,
    /// When work finished.
    pub completed_at: Option<DateTime<Utc>>,
    /// How the current contractor was chosen. Informational only.
    pub assignment_method: Option<AssignmentMethod>,
    /// Whether the assignment was made without admin involvement.
    pub auto_assigned: bool,
    /// Number of assignment attempts. Monotonically increasing.
    pub assignment_attempts: i32,
    /// Last time an admin was alerted about this job (cooldown anchor).
    pub last_admin_alert_at: Option<DateTime<Utc>>,
    /// Last time the customer received a reassurance notice (cooldown anchor).
    pub last_customer_notice_at: Option<DateTime<Utc>>,
    /// Last time the assigned contractor was reminded (cooldown anchor).
    pub last_contractor_reminder_at: Option<DateTime<Utc>>,
    /// The customer account that filed the job, if registered.
    pub customer_id: Option<CustomerId>,
    /// Guest contact name, for jobs filed without an account.
    pub guest_name: Option<String>,
    /// Guest contact email.
    pub guest_email: Option<String>,
    /// Guest contact phone.
    pub guest_phone: Option<String>,
    /// Job location latitude.
    pub location_lat: Option<f64>,
    /// Job location longitude.
    pub location_lng: Option<f64>,
    /// Route shared with the customer for live tracking, if one exists.
    pub route_id: Option<RouteId>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// The job's location as a point, when both coordinates are present.
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.location_lat, self.location_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The customer-facing email for this job, if any is known.
    pub fn customer_email(&self) -> Option<&str> {
        self.guest_email.as_deref()
    }

    /// Whether a customer contact exists for reassurance notices.
    pub fn has_customer_contact(&self) -> bool {
        self.customer_id.is_some() || self.guest_email.is_some() || self.guest_phone.is_some()
    }

    /// Minutes elapsed since creation.
    pub fn age_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_minutes()
    }

    /// Minutes elapsed since the current assignment, if assigned.
    pub fn assigned_age_minutes(&self, now: DateTime<Utc>) -> Option<i64> {
        self.assigned_at.map(|at| (now - at).num_minutes())
    }
}

/// Data required to create a new job. Jobs always start in [`JobStatus::New`]
/// with no contractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJob {
    /// Human-readable job number.
    pub job_number: String,
    /// Urgency level, 1-5.
    pub urgency: i16,
    /// Requested service type identifier.
    pub service_type: String,
    /// Estimated work duration in minutes.
    pub estimated_duration_minutes: i32,
    /// The customer account, if registered.
    pub customer_id: Option<CustomerId>,
    /// Guest contact name.
    pub guest_name: Option<String>,
    /// Guest contact email.
    pub guest_email: Option<String>,
    /// Guest contact phone.
    pub guest_phone: Option<String>,
    /// Job location latitude.
    pub location_lat: Option<f64>,
    /// Job location longitude.
    pub location_lng: Option<f64>,
}
