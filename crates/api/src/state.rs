use std::sync::Arc;

use followup_mailer::Mailer;

use crate::config::ServerConfig;
use crate::linkedin::LinkedInClient;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: followup_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Email provider client used by the dispatch job.
    pub mailer: Arc<dyn Mailer>,
    /// LinkedIn profile lookup client.
    pub linkedin: Arc<LinkedInClient>,
}
