//! Note model and the `note_status` enum.

use notesync_core::lww::Versioned;
use notesync_core::types::{AccountId, EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maps to the Postgres `note_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "note_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    #[default]
    Todo,
    Done,
}

/// A row from the `notes` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Note {
    pub id: EntityId,
    pub account_id: AccountId,
    pub note_type_id: Option<EntityId>,
    pub title: String,
    pub content: Option<String>,
    pub is_important: bool,
    pub status: NoteStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Versioned for Note {
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
