//! SMTP delivery via the `lettre` async transport.
//!
//! Configuration is loaded from environment variables; if `SMTP_HOST` is not
//! set, [`MailerConfig::from_env`] returns `None` and the service cannot
//! start (reminder delivery is the whole point of the cron job).

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::message::ReminderEmail;
use crate::{Mailer, SendResult};

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@followup.local";

/// Upper bound on a single SMTP conversation.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Error raised while constructing the SMTP transport.
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    /// The relay could not be configured (bad hostname, TLS setup).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The configured `SMTP_FROM` address could not be parsed.
    #[error("Sender address parse error: {0}")]
    FromAddress(#[from] lettre::address::AddressError),
}

// ---------------------------------------------------------------------------
// MailerConfig
// ---------------------------------------------------------------------------

/// Configuration for the SMTP mailer.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl MailerConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default                   |
    /// |-----------------|----------|---------------------------|
    /// | `SMTP_HOST`     | yes      | —                         |
    /// | `SMTP_PORT`     | no       | `587`                     |
    /// | `SMTP_FROM`     | no       | `noreply@followup.local`  |
    /// | `SMTP_USER`     | no       | —                         |
    /// | `SMTP_PASSWORD` | no       | —                         |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// SmtpMailer
// ---------------------------------------------------------------------------

/// Production [`Mailer`] backed by an async SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: lettre::Address,
}

impl SmtpMailer {
    /// Build the STARTTLS transport from configuration.
    pub fn new(config: &MailerConfig) -> Result<Self, MailerError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: config.from_address.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    /// Send one reminder email, folding every failure into [`SendResult`].
    ///
    /// Classification:
    /// - unparseable recipient or unbuildable message → permanent
    /// - SMTP 5xx response → permanent
    /// - SMTP 4xx, connection failures, timeouts → transient
    async fn send(&self, email: &ReminderEmail) -> SendResult {
        let to: lettre::Address = match email.to.parse() {
            Ok(addr) => addr,
            Err(e) => {
                return SendResult::permanent(format!("invalid recipient address: {e}"));
            }
        };

        let message = match Message::builder()
            .from(Mailbox::new(None, self.from.clone()))
            .to(Mailbox::new(None, to))
            .subject(email.subject())
            .header(ContentType::TEXT_HTML)
            .body(email.html_body())
        {
            Ok(message) => message,
            Err(e) => {
                return SendResult::permanent(format!("failed to build message: {e}"));
            }
        };

        match tokio::time::timeout(SEND_TIMEOUT, self.transport.send(message)).await {
            Ok(Ok(_response)) => {
                tracing::info!(to = %email.to, "Reminder email sent");
                SendResult::Delivered
            }
            Ok(Err(e)) if e.is_permanent() => {
                SendResult::permanent(format!("SMTP permanent rejection: {e}"))
            }
            Ok(Err(e)) => SendResult::transient(format!("SMTP error: {e}")),
            Err(_) => SendResult::transient(format!(
                "SMTP send timed out after {}s",
                SEND_TIMEOUT.as_secs()
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
