//! Transactional email delivery for connection reminders.
//!
//! - [`Mailer`] — the provider seam: one async `send` returning a typed
//!   [`SendResult`]. Permanent-vs-transient classification happens here, at
//!   the client boundary, never downstream.
//! - [`SmtpMailer`] — the production implementation over the `lettre`
//!   async SMTP transport.
//! - [`message::ReminderEmail`] — the pure payload/rendering step.

pub mod message;
pub mod smtp;

use async_trait::async_trait;

use crate::message::ReminderEmail;

/// Terminal result of a single delivery attempt, decided once by the
/// provider client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendResult {
    /// The provider accepted the message.
    Delivered,
    /// The provider rejected the message.
    Rejected {
        /// `true` when retrying is futile (invalid/blocked recipient,
        /// malformed message). `false` for network or provider hiccups.
        permanent: bool,
        /// Human-readable failure detail for logs and per-record results.
        detail: String,
    },
}

impl SendResult {
    /// Shorthand for a transient rejection.
    pub fn transient(detail: impl Into<String>) -> Self {
        SendResult::Rejected {
            permanent: false,
            detail: detail.into(),
        }
    }

    /// Shorthand for a permanent rejection.
    pub fn permanent(detail: impl Into<String>) -> Self {
        SendResult::Rejected {
            permanent: true,
            detail: detail.into(),
        }
    }
}

/// Provider seam for sending one reminder email.
///
/// Implementations never panic and never return a raw transport error; every
/// outcome is folded into [`SendResult`].
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &ReminderEmail) -> SendResult;
}

pub use smtp::{MailerConfig, SmtpMailer};
