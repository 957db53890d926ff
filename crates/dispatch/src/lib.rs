//! The reminder dispatch job.
//!
//! Invoked once per external scheduler trigger (the secured cron endpoint in
//! the API crate), it composes three steps per invocation:
//!
//! 1. **Batch fetcher** — pages through due, unfulfilled reminders via the
//!    [`ReminderStore`] seam.
//! 2. **Bounded dispatcher** — fans each batch out across at most
//!    `concurrency` in-flight sends, isolating per-record failures.
//! 3. **Retrying sender** — delivers one email with capped exponential
//!    backoff, short-circuiting on permanent provider rejections.
//!
//! Successful sends fulfill the record (`reminded = true, remind_at = NULL`);
//! failed sends leave it untouched so the next scheduled invocation retries
//! naturally.

pub mod config;
pub mod job;
pub mod sender;
pub mod store;

pub use config::DispatchConfig;
pub use job::{DispatchOutcome, RecordResult, ReminderDispatchJob};
pub use sender::{send_with_retry, SendStatus};
pub use store::{PgReminderStore, ReminderStore};
