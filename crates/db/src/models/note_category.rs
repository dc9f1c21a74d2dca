//! Note/category link model.

use notesync_core::lww::Versioned;
use notesync_core::types::{EntityId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `note_categories` table.
///
/// Links carry no `updated_at`; `created_at` is their version, and a
/// tombstone always wins over a live stored link.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct NoteCategory {
    pub note_id: EntityId,
    pub category_id: EntityId,
    pub created_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl NoteCategory {
    pub fn live(note_id: EntityId, category_id: EntityId, created_at: Timestamp) -> Self {
        Self {
            note_id,
            category_id,
            created_at,
            deleted_at: None,
        }
    }
}

impl Versioned for NoteCategory {
    type Key = (EntityId, EntityId);
    const TOMBSTONE_ALWAYS_WINS: bool = true;

    fn key(&self) -> (EntityId, EntityId) {
        (self.note_id, self.category_id)
    }

    fn modified_at(&self) -> Timestamp {
        self.created_at
    }

    fn deleted_at(&self) -> Option<Timestamp> {
        self.deleted_at
    }

    fn raise_version(&mut self, to: Timestamp) {
        self.created_at = to;
    }
}
