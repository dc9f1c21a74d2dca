//! Reminder model and the `reminder_offset_unit` enum.

use notesync_core::lww::Versioned;
use notesync_core::types::{AccountId, EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maps to the Postgres `reminder_offset_unit` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reminder_offset_unit", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReminderOffsetUnit {
    Minutes,
    Hours,
    Days,
}

/// A row from the `reminders` table.
///
/// Reminders are owned directly by an account. Both the note and the
/// schedule reference are optional.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Reminder {
    pub id: EntityId,
    pub account_id: AccountId,
    pub note_id: Option<EntityId>,
    pub schedule_id: Option<EntityId>,
    pub offset_value: Option<i32>,
    pub offset_unit: Option<ReminderOffsetUnit>,
    pub is_notification: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Versioned for Reminder {
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
