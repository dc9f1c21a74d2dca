//! Note type model.
//!
//! Note types are either global (seeded by the server, readable by every
//! account) or owned by one account. The nullable `account_id` column is
//! decoded straight into [`Ownership`].

use notesync_core::entity::Ownership;
use notesync_core::lww::Versioned;
use notesync_core::types::{EntityId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `note_types` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct NoteType {
    pub id: EntityId,
    #[sqlx(rename = "account_id", try_from = "Option<Uuid>")]
    pub owner: Ownership,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl NoteType {
    pub fn is_global(&self) -> bool {
        self.owner.is_global()
    }
}

impl Versioned for NoteType {
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
