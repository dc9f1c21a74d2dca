//! Schedule model and the `recurrence_type` enum.

use notesync_core::lww::Versioned;
use notesync_core::types::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maps to the Postgres `recurrence_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "recurrence_type", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum RecurrenceType {
    /// Every `recurrence_interval` days.
    IntervalDays,
    /// Every `recurrence_interval` years on the start date.
    IntervalYears,
    /// Weekly on weekday `recurrence_day`.
    DayBasedWeekly,
    /// Monthly on day-of-month `recurrence_day`.
    DayBasedMonthly,
}

/// A row from the `schedules` table. Owned through its note.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Schedule {
    pub id: EntityId,
    pub note_id: EntityId,
    pub start_date_time: Option<Timestamp>,
    pub end_date_time: Option<Timestamp>,
    pub recurrence_type: Option<RecurrenceType>,
    pub recurrence_interval: Option<i32>,
    pub recurrence_day: Option<i32>,
    pub recurrence_end_date: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Versioned for Schedule {
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
