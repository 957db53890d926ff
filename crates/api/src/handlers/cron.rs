//! Handler for the scheduler-triggered reminder dispatch endpoint.
//!
//! An external cron caller hits `GET /api/v1/cron/reminders` with a shared
//! bearer secret. Invocation is at-least-once and not guarded against
//! overlap; runs are safe to repeat because only successful sends mutate
//! state.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use followup_core::types::Timestamp;
use followup_dispatch::{PgReminderStore, ReminderDispatchJob};

use crate::state::AppState;

/// Successful run payload for the scheduler/operator.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CronResponse {
    pub message: &'static str,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Wall-clock duration in milliseconds.
    pub duration: i64,
    pub processed_count: u64,
    pub failed_count: u64,
}

/// Fatal run payload.
#[derive(Debug, Serialize)]
pub struct CronErrorResponse {
    pub error: &'static str,
    pub message: String,
}

/// Compare the `Authorization` header against the configured cron secret.
fn cron_authorized(header: Option<&str>, secret: &str) -> bool {
    match header {
        Some(value) => value == format!("Bearer {secret}"),
        None => false,
    }
}

/// GET /api/v1/cron/reminders
///
/// Runs one reminder dispatch invocation and reports aggregate counters.
/// A bad or missing secret short-circuits to 401 before any work happens;
/// a fetch-level failure surfaces as 500.
pub async fn run_reminder_dispatch(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let auth_header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if !cron_authorized(auth_header, &state.config.cron_secret) {
        tracing::warn!("Cron trigger rejected: bad or missing secret");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let start_time = Utc::now();
    tracing::info!(%start_time, "Cron reminder dispatch started");

    let store = Arc::new(PgReminderStore::new(state.pool.clone()));
    let job = ReminderDispatchJob::new(
        store,
        Arc::clone(&state.mailer),
        state.config.dispatch.clone(),
    );

    match job.run(start_time).await {
        Ok(outcome) => {
            let end_time = Utc::now();
            let duration = (end_time - start_time).num_milliseconds();
            tracing::info!(
                %end_time,
                duration,
                processed = outcome.processed,
                failed = outcome.failed,
                "Cron reminder dispatch completed"
            );
            (
                StatusCode::OK,
                Json(CronResponse {
                    message: "Reminder dispatch completed",
                    start_time,
                    end_time,
                    duration,
                    processed_count: outcome.processed,
                    failed_count: outcome.failed,
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Cron reminder dispatch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CronErrorResponse {
                    error: "Internal Server Error",
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_secret_is_authorized() {
        assert!(cron_authorized(Some("Bearer s3cret"), "s3cret"));
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(!cron_authorized(None, "s3cret"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        assert!(!cron_authorized(Some("Bearer nope"), "s3cret"));
    }

    #[test]
    fn bare_secret_without_bearer_prefix_is_rejected() {
        assert!(!cron_authorized(Some("s3cret"), "s3cret"));
    }

    #[test]
    fn cron_response_serializes_camel_case() {
        let now = Utc::now();
        let response = CronResponse {
            message: "Reminder dispatch completed",
            start_time: now,
            end_time: now,
            duration: 12,
            processed_count: 3,
            failed_count: 1,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("startTime").is_some());
        assert!(value.get("endTime").is_some());
        assert_eq!(value["processedCount"], 3);
        assert_eq!(value["failedCount"], 1);
    }
}
