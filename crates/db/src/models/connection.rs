//! Connection entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use followup_core::types::{DbId, Timestamp};

/// A row from the `connections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Connection {
    pub id: DbId,
    pub owner_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub company_name: String,
    pub company_url: String,
    pub linkedin_url: String,
    pub profile_picture: String,
    pub note: Option<String>,
    pub remind_at: Option<Timestamp>,
    pub reminded: bool,
    pub created_at: Timestamp,
}

impl Connection {
    /// Contact display name, e.g. `"Ada Lovelace"`.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Insert payload for a new connection.
#[derive(Debug, Clone)]
pub struct NewConnection {
    pub owner_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub company_name: String,
    pub company_url: String,
    pub linkedin_url: String,
    pub profile_picture: String,
    pub note: Option<String>,
    pub remind_at: Timestamp,
}

/// Listing filter: which fulfillment state the caller wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Pending reminders (`reminded = false`).
    #[default]
    Active,
    /// Already-fulfilled reminders (`reminded = true`).
    Inactive,
}

impl ConnectionStatus {
    /// The `reminded` column value this status selects.
    pub fn reminded(self) -> bool {
        matches!(self, ConnectionStatus::Inactive)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
