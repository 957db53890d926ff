//! Domain error taxonomy shared across the workspace.

use crate::types::DbId;

/// Domain-level errors raised by core logic and mapped to HTTP statuses
/// in the API crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup came up empty.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Caller-supplied input failed validation.
    #[error("{0}")]
    Validation(String),

    /// The caller is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller is authenticated but does not own the resource.
    #[error("{0}")]
    Forbidden(String),
}
