//! Dispatch job configuration.
//!
//! All knobs live in one explicit struct handed to
//! [`ReminderDispatchJob::new`](crate::job::ReminderDispatchJob::new); the
//! job itself never reads process state.

use std::time::Duration;

use followup_core::retry::RetryPolicy;

/// Default page size for the due-reminder scan.
pub const DEFAULT_BATCH_SIZE: i64 = 50;

/// Default ceiling on concurrently in-flight sends.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Tuning knobs for one dispatch invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Records fetched per page.
    pub batch_size: i64,
    /// Maximum simultaneous send operations within a batch.
    pub concurrency: usize,
    /// Per-record retry schedule.
    pub retry: RetryPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryPolicy::default(),
        }
    }
}

impl DispatchConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Variable                 | Default |
    /// |--------------------------|---------|
    /// | `REMINDER_BATCH_SIZE`    | `50`    |
    /// | `REMINDER_CONCURRENCY`   | `5`     |
    /// | `REMINDER_MAX_ATTEMPTS`  | `3`     |
    /// | `REMINDER_BASE_DELAY_MS` | `1000`  |
    /// | `REMINDER_MAX_DELAY_MS`  | `10000` |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            batch_size: env_parse("REMINDER_BATCH_SIZE", defaults.batch_size),
            concurrency: env_parse("REMINDER_CONCURRENCY", defaults.concurrency),
            retry: RetryPolicy {
                max_attempts: env_parse(
                    "REMINDER_MAX_ATTEMPTS",
                    defaults.retry.max_attempts,
                ),
                base_delay: Duration::from_millis(env_parse(
                    "REMINDER_BASE_DELAY_MS",
                    defaults.retry.base_delay.as_millis() as u64,
                )),
                max_delay: Duration::from_millis(env_parse(
                    "REMINDER_MAX_DELAY_MS",
                    defaults.retry.max_delay.as_millis() as u64,
                )),
            },
        }
    }
}

/// Parse an environment variable, falling back to the default on absence
/// or parse failure.
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
