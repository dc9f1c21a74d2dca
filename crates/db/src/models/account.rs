//! Account model.

use notesync_core::types::{AccountId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `accounts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    /// Cursor handed back by the most recent sync.
    pub last_sync_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccount {
    pub username: String,
    pub email: String,
}
