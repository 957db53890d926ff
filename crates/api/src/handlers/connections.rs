//! Handlers for the `/connections` resource.
//!
//! All endpoints require authentication via [`AuthUser`]; callers only ever
//! see and mutate their own connections.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use followup_core::error::CoreError;
use followup_core::reminder;
use followup_core::types::DbId;
use followup_db::models::connection::{Connection, ConnectionStatus, NewConnection};
use followup_db::repositories::ConnectionRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Default page size for listings.
const DEFAULT_PAGE_LIMIT: i64 = 5;

/// Upper bound on requested page size.
const MAX_PAGE_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a connection by id and verify the caller owns it.
///
/// Returns `NotFound` if the connection does not exist, `Forbidden` if the
/// caller is not the owner. `action` is used in the error message (e.g.
/// "view", "archive", "delete").
async fn find_and_authorize(
    pool: &sqlx::PgPool,
    id: DbId,
    auth: &AuthUser,
    action: &str,
) -> AppResult<Connection> {
    let connection = ConnectionRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Connection",
            id,
        }))?;

    if connection.owner_id != auth.owner_id {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "You do not have permission to {action} this connection"
        ))));
    }

    Ok(connection)
}

/// Number of pages needed for `total` rows at `limit` rows per page.
fn total_pages(total: i64, limit: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Request body for creating a connection from a scanned profile URL.
#[derive(Debug, Deserialize)]
pub struct CreateConnection {
    /// Scanned LinkedIn profile URL (query string is stripped).
    pub linkedin_url: String,
    /// Whole hours until the reminder fires.
    pub hours: i64,
    /// Address the reminder email goes to.
    pub email: String,
    /// Optional free-text note (bounded length).
    pub note: Option<String>,
}

/// POST /api/v1/connections
///
/// Validates input, looks the profile up through the LinkedIn client, and
/// stores the reminder record. Returns 201 with the created connection.
pub async fn create_connection(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateConnection>,
) -> AppResult<impl IntoResponse> {
    reminder::validate_remind_hours(input.hours)?;
    reminder::validate_note(input.note.as_deref())?;
    reminder::validate_email(&input.email)?;
    let linkedin_url = reminder::normalize_profile_url(&input.linkedin_url)?;

    let profile = state
        .linkedin
        .fetch_profile(&linkedin_url)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let now = Utc::now();
    let new_connection = NewConnection {
        owner_id: auth.owner_id,
        email: input.email,
        first_name: profile.first_name,
        last_name: profile.last_name,
        position: profile.position,
        company_name: profile.company_name,
        company_url: profile.company_url,
        linkedin_url,
        profile_picture: profile.profile_picture,
        note: input.note,
        remind_at: reminder::remind_at_from_hours(now, input.hours),
    };

    let connection = ConnectionRepo::create(&state.pool, &new_connection).await?;

    tracing::info!(
        id = connection.id,
        owner_id = %connection.owner_id,
        remind_at = %new_connection.remind_at,
        "Connection created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: connection })))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// Query parameters for the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: ConnectionStatus,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

/// Listing response: one page of connections plus pagination metadata.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub reminders: Vec<Connection>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub pages: i64,
    pub current: i64,
}

/// GET /api/v1/connections?status=&page=&limit=
///
/// Lists the caller's connections filtered by fulfillment state, newest
/// first.
pub async fn list_connections(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ListResponse>> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, MAX_PAGE_LIMIT);
    let offset = (page - 1) * limit;

    let total = ConnectionRepo::count_for_owner(&state.pool, &auth.owner_id, query.status).await?;
    let reminders =
        ConnectionRepo::list_for_owner(&state.pool, &auth.owner_id, query.status, limit, offset)
            .await?;

    Ok(Json(ListResponse {
        reminders,
        pagination: Pagination {
            total,
            pages: total_pages(total, limit),
            current: page,
        },
    }))
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

/// GET /api/v1/connections/{id}
pub async fn get_connection(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Connection>>> {
    let connection = find_and_authorize(&state.pool, id, &auth, "view").await?;
    Ok(Json(DataResponse { data: connection }))
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

/// POST /api/v1/connections/{id}/archive
///
/// User-initiated fulfillment: marks the connection reminded and clears its
/// reminder time, taking it out of the dispatch job's scan.
pub async fn archive_connection(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Connection>>> {
    let connection = find_and_authorize(&state.pool, id, &auth, "archive").await?;

    let updated = ConnectionRepo::mark_fulfilled(&state.pool, id).await?;
    if updated {
        tracing::info!(id, owner_id = %auth.owner_id, "Connection archived");
    }

    let connection = ConnectionRepo::find_by_id(&state.pool, id)
        .await?
        .unwrap_or(connection);
    Ok(Json(DataResponse { data: connection }))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/v1/connections/{id}
pub async fn delete_connection(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_and_authorize(&state.pool, id, &auth, "delete").await?;
    ConnectionRepo::delete(&state.pool, id).await?;

    tracing::info!(id, owner_id = %auth.owner_id, "Connection deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 5), 0);
        assert_eq!(total_pages(1, 5), 1);
        assert_eq!(total_pages(5, 5), 1);
        assert_eq!(total_pages(6, 5), 2);
        assert_eq!(total_pages(11, 5), 3);
    }

    #[test]
    fn list_query_defaults() {
        let query: ListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.status, ConnectionStatus::Active);
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn list_query_parses_status() {
        let query: ListQuery = serde_json::from_str(r#"{"status":"inactive"}"#).unwrap();
        assert_eq!(query.status, ConnectionStatus::Inactive);
    }
}
