//! Notification sender trait and template keys.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies an email template. Rendering lives in the sender; the engine
/// only picks the key and supplies the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKey {
    /// "We're finding you a mechanic" reassurance notice.
    CustomerSearching,
    /// Customer-facing queue position update.
    CustomerQueuePosition,
    /// New assignment notice to a contractor.
    ContractorAssigned,
    /// Acceptance reminder to a contractor.
    ContractorReminder,
    /// A job was pulled out of a contractor's queue.
    ContractorQueueVacated,
    /// A job was moved into a contractor's queue.
    ContractorQueueReceived,
    /// Admin alert for a job stuck unassigned.
    AdminUnassignedAlert,
}

impl TemplateKey {
    /// Stable string key, also used in queue-entry notification logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerSearching => "customer_searching",
            Self::CustomerQueuePosition => "customer_queue_position",
            Self::ContractorAssigned => "contractor_assigned",
            Self::ContractorReminder => "contractor_reminder",
            Self::ContractorQueueVacated => "contractor_queue_vacated",
            Self::ContractorQueueReceived => "contractor_queue_received",
            Self::AdminUnassignedAlert => "admin_unassigned_alert",
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Best-effort email delivery.
///
/// Implementations retry internally and log failures; the return value
/// reports delivery success but the caller never treats `false` as fatal —
/// queue and job state changes are not rolled back on notification failure.
#[async_trait]
pub trait NotificationSender: Send + Sync + std::fmt::Debug + 'static {
    /// Render and send a templated email. Returns whether delivery
    /// (eventually) succeeded.
    async fn send_email(&self, to: &str, template: TemplateKey, data: serde_json::Value) -> bool;
}
