//! Storage seam for the dispatch job.
//!
//! [`ReminderStore`] mirrors the two storage operations the job needs so
//! tests can run against an in-memory fake. [`PgReminderStore`] is the
//! production implementation over [`ConnectionRepo`].

use async_trait::async_trait;

use followup_core::types::{DbId, Timestamp};
use followup_db::models::connection::Connection;
use followup_db::repositories::ConnectionRepo;
use followup_db::DbPool;

/// Storage operations used by the dispatch job.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// One page of records matching `remind_at <= now AND reminded = false`.
    async fn find_due(
        &self,
        now: Timestamp,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Connection>, sqlx::Error>;

    /// Fulfill a record (`reminded = true, remind_at = NULL`), conditional on
    /// it being unfulfilled. Returns `true` if a row was updated.
    async fn mark_fulfilled(&self, id: DbId) -> Result<bool, sqlx::Error>;
}

/// Production store backed by the Postgres pool.
pub struct PgReminderStore {
    pool: DbPool,
}

impl PgReminderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderStore for PgReminderStore {
    async fn find_due(
        &self,
        now: Timestamp,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Connection>, sqlx::Error> {
        ConnectionRepo::find_due(&self.pool, now, skip, limit).await
    }

    async fn mark_fulfilled(&self, id: DbId) -> Result<bool, sqlx::Error> {
        ConnectionRepo::mark_fulfilled(&self.pool, id).await
    }
}
