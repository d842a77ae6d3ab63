//! Contractor profile entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use roadhub_core::types::geo::GeoPoint;
use roadhub_core::types::id::ContractorId;

use super::schedule::WeeklySchedule;

/// A field contractor's dispatch-relevant profile.
///
/// The `online`/`available` flags are the contractor's own toggles; the
/// availability evaluator combines them with schedule, vacations, and the
/// daily job cap to answer "can this contractor take a job right now".
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContractorProfile {
    /// Contractor identifier (same as the platform user id).
    pub id: ContractorId,
    /// Display name shown to customers and admins.
    pub display_name: String,
    /// Contact email for dispatch notifications.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Whether the contractor's app session is currently connected.
    pub online: bool,
    /// Whether the contractor has toggled themselves open for work.
    pub available: bool,
    /// Maximum jobs per day. `None` means unlimited.
    pub max_jobs_per_day: Option<i32>,
    /// Weekly working-hours schedule.
    pub working_hours: Json<WeeklySchedule>,
    /// Home-base latitude, used for proximity ordering.
    pub base_lat: Option<f64>,
    /// Home-base longitude.
    pub base_lng: Option<f64>,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
    /// When the profile was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ContractorProfile {
    /// The contractor's base location, when both coordinates are present.
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.base_lat, self.base_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }

    /// The weekly schedule.
    pub fn schedule(&self) -> &WeeklySchedule {
        &self.working_hours.0
    }
}
