//! Notification sender configuration.

use serde::{Deserialize, Serialize};

/// SMTP notification sender configuration.
///
/// A missing `smtp_host` disables the sender: the condition is logged once
/// at startup and every subsequent send short-circuits to a recorded
/// failure instead of erroring per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// SMTP server hostname. Unset disables email delivery.
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP server port (STARTTLS).
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Optional SMTP username.
    #[serde(default)]
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// Delivery attempts per message before recording a failure.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff between delivery attempts, in milliseconds.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            from_address: default_from_address(),
            smtp_user: None,
            smtp_password: None,
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "noreply@roadhub.local".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    500
}
