//! # roadhub-notify
//!
//! Best-effort email delivery for the dispatch engine. The sender retries
//! internally with jittered backoff and records failures instead of
//! surfacing them; missing SMTP configuration disables delivery entirely,
//! logged once at startup.

pub mod sender;
pub mod template;

pub use sender::SmtpNotificationSender;
