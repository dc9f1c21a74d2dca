//! Category model.

use notesync_core::lww::Versioned;
use notesync_core::types::{AccountId, EntityId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `categories` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Category {
    pub id: EntityId,
    pub account_id: AccountId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Versioned for Category {
    type Key = EntityId;

    fn key(&self) -> EntityId {
        self.id
    }

    fn modified_at(&self) -> Timestamp {
        self.updated_at
    }

    fn deleted_at(&self) -> Option<Timestamp> {
        self.deleted_at
    }

    fn raise_version(&mut self, to: Timestamp) {
        self.updated_at = to;
    }
}
