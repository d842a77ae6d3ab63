//! Plain-text email rendering per template key.

use serde_json::Value;

use roadhub_entity::traits::notifier::TemplateKey;

/// Render subject and body for a template with its data payload.
pub fn render(template: TemplateKey, data: &Value) -> (String, String) {
    let job_number = field(data, "job_number");
    match template {
        TemplateKey::CustomerSearching => (
            format!("[RoadHub] We're finding you a mechanic ({job_number})"),
            format!(
                "We're still matching your request {job_number} with a nearby mechanic.\n\
                 Hang tight — you'll get a confirmation the moment one accepts.\n\
                 Waiting so far: {} minutes.",
                field(data, "waiting_minutes"),
            ),
        ),
        TemplateKey::CustomerQueuePosition => (
            format!("[RoadHub] Your position in the queue ({job_number})"),
            format!(
                "Your request {job_number} is number {} in your mechanic's queue.\n\
                 We'll let you know when they're on the way.",
                field(data, "position"),
            ),
        ),
        TemplateKey::ContractorAssigned => (
            format!("[RoadHub] New job {job_number}"),
            format!(
                "You've been assigned job {job_number}.\n\
                 Service: {}\nUrgency: {}\n\
                 Open the app to accept.",
                field(data, "service_type"),
                field(data, "urgency"),
            ),
        ),
        TemplateKey::ContractorReminder => (
            format!("[RoadHub] Reminder: job {job_number} is waiting"),
            format!(
                "Job {job_number} is still waiting for your acceptance.\n\
                 Service: {}\nUrgency: {}\nCustomer: {}\nPhone: {}\n\
                 If you can't take it, it will be offered to another mechanic.",
                field(data, "service_type"),
                field(data, "urgency"),
                field(data, "customer_name"),
                field(data, "customer_phone"),
            ),
        ),
        TemplateKey::ContractorQueueVacated => (
            format!("[RoadHub] Job {job_number} was moved off your queue"),
            format!(
                "Job {job_number} ({}) sat in your queue too long and has been \
                 handed to another mechanic.",
                field(data, "service_type"),
            ),
        ),
        TemplateKey::ContractorQueueReceived => (
            format!("[RoadHub] Job {job_number} was added to your queue"),
            format!(
                "Job {job_number} ({}) was moved into your queue from another \
                 mechanic. Open the app to review it.",
                field(data, "service_type"),
            ),
        ),
        TemplateKey::AdminUnassignedAlert => (
            format!("[RoadHub] ALERT: job {job_number} still unassigned"),
            format!(
                "Job {job_number} has been waiting {} minutes without a mechanic.\n\
                 Service: {}\nUrgency: {}\nAssignment attempts so far: {}.",
                field(data, "waiting_minutes"),
                field(data, "service_type"),
                field(data, "urgency"),
                field(data, "attempts"),
            ),
        ),
    }
}

/// Pull a field as display text, tolerating absent or non-string values.
fn field(data: &Value, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    }
}
