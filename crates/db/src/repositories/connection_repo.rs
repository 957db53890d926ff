//! Repository for the `connections` table.

use sqlx::PgPool;

use followup_core::types::{DbId, Timestamp};

use crate::models::connection::{Connection, ConnectionStatus, NewConnection};

/// Column list for `connections` queries.
const COLUMNS: &str = "id, owner_id, email, first_name, last_name, position, company_name, \
     company_url, linkedin_url, profile_picture, note, remind_at, reminded, created_at";

/// Provides CRUD operations and the due-reminder scan for connections.
pub struct ConnectionRepo;

impl ConnectionRepo {
    /// Insert a new connection, returning the stored row.
    pub async fn create(pool: &PgPool, input: &NewConnection) -> Result<Connection, sqlx::Error> {
        let query = format!(
            "INSERT INTO connections \
             (owner_id, email, first_name, last_name, position, company_name, \
              company_url, linkedin_url, profile_picture, note, remind_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Connection>(&query)
            .bind(&input.owner_id)
            .bind(&input.email)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.position)
            .bind(&input.company_name)
            .bind(&input.company_url)
            .bind(&input.linkedin_url)
            .bind(&input.profile_picture)
            .bind(&input.note)
            .bind(input.remind_at)
            .fetch_one(pool)
            .await
    }

    /// Fetch a single connection by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Connection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM connections WHERE id = $1");
        sqlx::query_as::<_, Connection>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's connections filtered by fulfillment state, newest first.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: &str,
        status: ConnectionStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Connection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM connections \
             WHERE owner_id = $1 AND reminded = $2 \
             ORDER BY created_at DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Connection>(&query)
            .bind(owner_id)
            .bind(status.reminded())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count a user's connections in the given fulfillment state.
    pub async fn count_for_owner(
        pool: &PgPool,
        owner_id: &str,
        status: ConnectionStatus,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM connections WHERE owner_id = $1 AND reminded = $2",
        )
        .bind(owner_id)
        .bind(status.reminded())
        .fetch_one(pool)
        .await
    }

    /// One page of due, unfulfilled reminders for the dispatch job.
    ///
    /// The predicate is `remind_at <= now AND reminded = false`; `now` is
    /// passed in so the whole invocation scans against one fixed instant.
    pub async fn find_due(
        pool: &PgPool,
        now: Timestamp,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Connection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM connections \
             WHERE remind_at <= $1 AND reminded = false \
             ORDER BY id \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Connection>(&query)
            .bind(now)
            .bind(limit)
            .bind(skip)
            .fetch_all(pool)
            .await
    }

    /// Mark a connection fulfilled and clear its reminder time.
    ///
    /// Conditional on `reminded = false` so a record is never fulfilled
    /// twice. Returns `true` if a row was updated.
    pub async fn mark_fulfilled(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE connections \
             SET reminded = true, remind_at = NULL \
             WHERE id = $1 AND reminded = false",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a connection. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM connections WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
