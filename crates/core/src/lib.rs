//! Pure domain logic for the followup reminder service.
//!
//! This crate has no internal dependencies and no I/O. It provides:
//!
//! - [`error::CoreError`] — the domain error taxonomy shared by all crates.
//! - [`types`] — database id and timestamp aliases.
//! - [`retry::RetryPolicy`] — capped exponential backoff arithmetic for the
//!   reminder dispatch job.
//! - [`reminder`] — input validation and scheduling arithmetic for
//!   connection reminders.

pub mod error;
pub mod reminder;
pub mod retry;
pub mod types;
