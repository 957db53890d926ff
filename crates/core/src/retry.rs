//! Capped exponential backoff policy for the retrying sender.
//!
//! The policy is pure arithmetic so the dispatch job can be unit tested
//! without a real clock or network: `delay_before_attempt(k)` is the pause
//! taken after attempt `k` fails transiently, before attempt `k + 1` starts.

use std::time::Duration;

/// Default number of delivery attempts per record per invocation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base backoff delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;

/// Default backoff delay cap in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

/// Retry schedule for a single email delivery: attempt ceiling plus a
/// capped exponential delay curve. No jitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first (must be at least 1).
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles per subsequent attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Delay taken after `completed_attempts` have failed transiently.
    ///
    /// Formula: `min(max_delay, base_delay * 2^(completed_attempts - 1))`.
    /// The exponent saturates, so a large attempt count returns `max_delay`
    /// instead of overflowing.
    pub fn delay_before_attempt(&self, completed_attempts: u32) -> Duration {
        debug_assert!(completed_attempts >= 1);
        let factor = 1u32
            .checked_shl(completed_attempts.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Whether another attempt is allowed after `completed_attempts` failures.
    pub fn allows_retry(&self, completed_attempts: u32) -> bool {
        completed_attempts < self.max_attempts
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
