//! Retrying sender: one email delivery with capped exponential backoff.
//!
//! Per-attempt state machine: `Pending → Sending → { Delivered,
//! PermanentlyRejected, TransientlyFailed }`. A transient failure with
//! attempts remaining loops back to `Sending` after the policy delay; a
//! permanent rejection short-circuits immediately.

use followup_core::retry::RetryPolicy;
use followup_mailer::message::ReminderEmail;
use followup_mailer::{Mailer, SendResult};

/// Terminal outcome of one delivery sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendStatus {
    /// The provider accepted the message.
    Delivered,
    /// The provider signalled that retrying is futile.
    PermanentlyRejected(String),
    /// Every allowed attempt failed transiently.
    TransientlyFailed(String),
}

impl SendStatus {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SendStatus::Delivered)
    }

    /// Failure detail for per-record results, `None` when delivered.
    pub fn error_detail(&self) -> Option<&str> {
        match self {
            SendStatus::Delivered => None,
            SendStatus::PermanentlyRejected(detail)
            | SendStatus::TransientlyFailed(detail) => Some(detail),
        }
    }
}

/// Attempt delivery up to the policy ceiling.
///
/// Never returns an error: every provider outcome is absorbed into
/// [`SendStatus`] so the dispatcher can treat non-delivery as "not sent,
/// do not mark fulfilled".
pub async fn send_with_retry(
    mailer: &dyn Mailer,
    email: &ReminderEmail,
    policy: &RetryPolicy,
) -> SendStatus {
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match mailer.send(email).await {
            SendResult::Delivered => return SendStatus::Delivered,
            SendResult::Rejected {
                permanent: true,
                detail,
            } => {
                tracing::warn!(to = %email.to, %detail, "Permanent rejection, not retrying");
                return SendStatus::PermanentlyRejected(detail);
            }
            SendResult::Rejected {
                permanent: false,
                detail,
            } => {
                if !policy.allows_retry(attempts) {
                    tracing::warn!(
                        to = %email.to,
                        attempts,
                        %detail,
                        "Delivery failed after final attempt"
                    );
                    return SendStatus::TransientlyFailed(detail);
                }
                let delay = policy.delay_before_attempt(attempts);
                tracing::debug!(
                    to = %email.to,
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    %detail,
                    "Transient send failure, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    /// Mailer that replays a scripted sequence of results.
    struct ScriptedMailer {
        script: Mutex<Vec<SendResult>>,
        calls: AtomicUsize,
    }

    impl ScriptedMailer {
        fn new(script: Vec<SendResult>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Mailer for ScriptedMailer {
        async fn send(&self, _email: &ReminderEmail) -> SendResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                SendResult::transient("script exhausted")
            } else {
                script.remove(0)
            }
        }
    }

    fn email() -> ReminderEmail {
        ReminderEmail {
            to: "user@example.com".into(),
            contact_name: "Ada Lovelace".into(),
            position: "Engineer".into(),
            company_name: "Analytical Engines".into(),
            company_url: String::new(),
            note: None,
        }
    }

    #[tokio::test]
    async fn first_attempt_success_sends_once() {
        let mailer = ScriptedMailer::new(vec![SendResult::Delivered]);
        let status = send_with_retry(&mailer, &email(), &RetryPolicy::default()).await;
        assert!(status.is_delivered());
        assert_eq!(mailer.calls(), 1);
    }

    #[tokio::test]
    async fn permanent_rejection_short_circuits() {
        let mailer = ScriptedMailer::new(vec![SendResult::permanent("blocked recipient")]);
        let status = send_with_retry(&mailer, &email(), &RetryPolicy::default()).await;
        assert_matches!(status, SendStatus::PermanentlyRejected(detail) => {
            assert_eq!(detail, "blocked recipient");
        });
        assert_eq!(mailer.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_retry_with_backoff() {
        let mailer = ScriptedMailer::new(vec![
            SendResult::transient("connection reset"),
            SendResult::transient("connection reset"),
            SendResult::Delivered,
        ]);
        let started = tokio::time::Instant::now();
        let status = send_with_retry(&mailer, &email(), &RetryPolicy::default()).await;
        assert!(status.is_delivered());
        assert_eq!(mailer.calls(), 3);
        // 1s before attempt 2, 2s before attempt 3.
        assert_eq!(started.elapsed(), std::time::Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn ceiling_exhaustion_reports_transient_failure() {
        let mailer = ScriptedMailer::new(vec![
            SendResult::transient("451 try later"),
            SendResult::transient("451 try later"),
            SendResult::transient("451 try later"),
        ]);
        let status = send_with_retry(&mailer, &email(), &RetryPolicy::default()).await;
        assert_matches!(status, SendStatus::TransientlyFailed(_));
        assert_eq!(mailer.calls(), 3);
    }

    #[tokio::test]
    async fn error_detail_is_none_when_delivered() {
        assert_eq!(SendStatus::Delivered.error_detail(), None);
        assert_eq!(
            SendStatus::TransientlyFailed("x".into()).error_detail(),
            Some("x")
        );
    }
}
