pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{connections, cron};
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /connections                 list (GET), create (POST)
/// /connections/{id}            details (GET), delete (DELETE)
/// /connections/{id}/archive    user-initiated fulfillment (POST)
///
/// /cron/reminders              reminder dispatch trigger (GET, cron secret)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/connections",
            get(connections::list_connections).post(connections::create_connection),
        )
        .route(
            "/connections/{id}",
            get(connections::get_connection).delete(connections::delete_connection),
        )
        .route(
            "/connections/{id}/archive",
            post(connections::archive_connection),
        )
        .route("/cron/reminders", get(cron::run_reminder_dispatch))
}
