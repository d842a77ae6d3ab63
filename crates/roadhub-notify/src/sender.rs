//! SMTP notification sender.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use rand::Rng;
use tracing::{debug, error, warn};

use roadhub_core::config::notifier::NotifierConfig;
use roadhub_entity::traits::notifier::{NotificationSender, TemplateKey};

use crate::template;

/// Error type for a single delivery attempt.
#[derive(Debug, thiserror::Error)]
enum DeliveryError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

/// [`NotificationSender`] over async SMTP.
///
/// Missing SMTP configuration disables the sender: the condition is logged
/// once here, and every later send short-circuits to a recorded failure
/// instead of erroring per call. Configured senders retry each message a
/// bounded number of times with jittered backoff.
pub struct SmtpNotificationSender {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    config: NotifierConfig,
}

impl std::fmt::Debug for SmtpNotificationSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotificationSender")
            .field("enabled", &self.mailer.is_some())
            .finish()
    }
}

impl SmtpNotificationSender {
    /// Build the sender from configuration.
    pub fn new(config: NotifierConfig) -> Self {
        let mailer = match config.smtp_host.as_deref() {
            Some(host) => match build_transport(host, &config) {
                Ok(mailer) => Some(mailer),
                Err(e) => {
                    error!(error = %e, "SMTP transport setup failed, email delivery disabled");
                    None
                }
            },
            None => {
                warn!("SMTP host not configured, email delivery disabled");
                None
            }
        };
        Self { mailer, config }
    }

    /// Whether delivery is actually possible.
    pub fn is_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    async fn deliver(
        &self,
        mailer: &AsyncSmtpTransport<Tokio1Executor>,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| DeliveryError::Build(e.to_string()))?;

        mailer.send(email).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    async fn send_email(&self, to: &str, template: TemplateKey, data: serde_json::Value) -> bool {
        let Some(mailer) = &self.mailer else {
            debug!(to, template = %template, "Email delivery disabled, recording failure");
            return false;
        };

        let (subject, body) = template::render(template, &data);

        for attempt in 1..=self.config.max_attempts {
            match self.deliver(mailer, to, &subject, &body).await {
                Ok(()) => {
                    debug!(to, template = %template, attempt, "Notification email sent");
                    return true;
                }
                Err(e) => {
                    warn!(
                        to,
                        template = %template,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        error = %e,
                        "Email delivery attempt failed"
                    );
                    if attempt < self.config.max_attempts {
                        let jitter = rand::thread_rng().gen_range(0..250u64);
                        let backoff = self.config.retry_backoff_ms * u64::from(attempt) + jitter;
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                    }
                }
            }
        }

        error!(
            to,
            template = %template,
            attempts = self.config.max_attempts,
            "Email delivery failed after all attempts"
        );
        false
    }
}

fn build_transport(
    host: &str,
    config: &NotifierConfig,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, lettre::transport::smtp::Error> {
    let mut builder =
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(config.smtp_port);

    if let (Some(user), Some(password)) = (&config.smtp_user, &config.smtp_password) {
        builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
    }

    Ok(builder.build())
}
