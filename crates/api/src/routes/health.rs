//! Unauthenticated health endpoint for uptime monitors and the external
//! cron scheduler.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// GET /health payload.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `"ok"` when every probed dependency responds, `"degraded"` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub checks: HealthChecks,
}

/// Per-dependency probe results.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Connection pool round trip (`SELECT 1`).
    pub database: bool,
}

impl HealthReport {
    fn new(database: bool) -> Self {
        Self {
            status: if database { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            checks: HealthChecks { database },
        }
    }
}

/// Probe the database and report overall service health.
///
/// The pool is the only dependency probed per request. The SMTP relay and
/// the profile API fail lazily in the operations that use them, so a
/// round trip here would add load without adding signal.
async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let database = followup_db::health_check(&state.pool).await.is_ok();
    if !database {
        tracing::warn!("Health probe: database unreachable");
    }
    Json(HealthReport::new(database))
}

/// Routes mounted at the root, outside `/api/v1` and its auth.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
