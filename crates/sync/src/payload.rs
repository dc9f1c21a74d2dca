//! Wire format of a sync exchange.
//!
//! Everything is camelCase JSON. Incoming records never carry an owner: the
//! account is stamped on from the authenticated session when a payload is
//! turned into a row.

use notesync_core::deletion::DeletionTarget;
use notesync_core::entity::Ownership;
use notesync_core::types::{AccountId, EntityId, Timestamp};
use notesync_db::models::{
    Category, Note, NoteCategory, NoteStatus, NoteType, RecurrenceType, Reminder,
    ReminderOffsetUnit, Schedule,
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request / response envelopes
// ---------------------------------------------------------------------------

/// Body of `POST /api/v1/sync`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncRequest {
    /// Cursor returned by the previous sync; absent on first sync.
    #[serde(alias = "lastSyncAt", alias = "lastSyncDate")]
    pub last_sync_cursor: Option<Timestamp>,
    pub categories: Vec<CategoryPayload>,
    pub note_types: Vec<NoteTypePayload>,
    pub notes: Vec<NotePayload>,
    pub note_categories: Vec<NoteCategoryPayload>,
    pub schedules: Vec<SchedulePayload>,
    pub reminders: Vec<ReminderPayload>,
    pub deletions: Vec<DeletionDirective>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub new_cursor: Timestamp,
    /// The client's cursor predates the tombstone retention horizon: the
    /// lists below are a full snapshot and the client should replace its
    /// replica rather than merge.
    pub full_resync: bool,
    pub categories: Vec<CategoryPayload>,
    pub note_types: Vec<NoteTypePayload>,
    pub notes: Vec<NotePayload>,
    pub note_categories: Vec<NoteCategoryPayload>,
    pub schedules: Vec<SchedulePayload>,
    pub reminders: Vec<ReminderPayload>,
    pub deletions: Vec<DeletionDirective>,
}

impl SyncResponse {
    /// Number of entity records carried, deletions included.
    pub fn record_count(&self) -> usize {
        self.categories.len()
            + self.note_types.len()
            + self.notes.len()
            + self.note_categories.len()
            + self.schedules.len()
            + self.reminders.len()
            + self.deletions.len()
    }
}

/// `{ entityType, entityId }`. Kept as raw strings so a malformed directive
/// can be rejected on its own instead of failing the whole request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionDirective {
    pub entity_type: String,
    pub entity_id: String,
}

impl From<&DeletionTarget> for DeletionDirective {
    fn from(target: &DeletionTarget) -> Self {
        Self {
            entity_type: target.kind().as_str().to_string(),
            entity_id: target.entity_id(),
        }
    }
}

// ---------------------------------------------------------------------------
// Entity records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    pub id: EntityId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub deleted_at: Option<Timestamp>,
}

impl CategoryPayload {
    pub fn into_row(self, account_id: AccountId) -> Category {
        Category {
            id: self.id,
            account_id,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

impl From<Category> for CategoryPayload {
    fn from(row: Category) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteTypePayload {
    pub id: EntityId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub deleted_at: Option<Timestamp>,
    /// Set on server rows only; ignored on input.
    #[serde(default)]
    pub is_global: bool,
}

impl NoteTypePayload {
    /// Client-submitted note types are always owned by the submitter.
    pub fn into_row(self, account_id: AccountId) -> NoteType {
        NoteType {
            id: self.id,
            owner: Ownership::Account(account_id),
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

impl From<NoteType> for NoteTypePayload {
    fn from(row: NoteType) -> Self {
        Self {
            is_global: row.is_global(),
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePayload {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub note_type_id: Option<EntityId>,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default)]
    pub status: NoteStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub deleted_at: Option<Timestamp>,
    /// On input, when present, the complete set of categories the note
    /// belongs to. Always present on output.
    #[serde(default)]
    pub category_ids: Option<Vec<EntityId>>,
}

impl NotePayload {
    /// Split into the note row and the requested category set.
    pub fn into_row(self, account_id: AccountId) -> (Note, Option<Vec<EntityId>>) {
        let note = Note {
            id: self.id,
            account_id,
            note_type_id: self.note_type_id,
            title: self.title,
            content: self.content,
            is_important: self.is_important,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        };
        (note, self.category_ids)
    }

    pub fn from_row(row: Note, category_ids: Vec<EntityId>) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            note_type_id: row.note_type_id,
            is_important: row.is_important,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
            category_ids: Some(category_ids),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteCategoryPayload {
    pub note_id: EntityId,
    pub category_id: EntityId,
    pub created_at: Timestamp,
    #[serde(default)]
    pub deleted_at: Option<Timestamp>,
}

impl From<NoteCategoryPayload> for NoteCategory {
    fn from(p: NoteCategoryPayload) -> Self {
        Self {
            note_id: p.note_id,
            category_id: p.category_id,
            created_at: p.created_at,
            deleted_at: p.deleted_at,
        }
    }
}

impl From<NoteCategory> for NoteCategoryPayload {
    fn from(row: NoteCategory) -> Self {
        Self {
            note_id: row.note_id,
            category_id: row.category_id,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePayload {
    pub id: EntityId,
    pub note_id: EntityId,
    #[serde(default)]
    pub start_date_time: Option<Timestamp>,
    #[serde(default)]
    pub end_date_time: Option<Timestamp>,
    #[serde(default)]
    pub recurrence_type: Option<RecurrenceType>,
    #[serde(default)]
    pub recurrence_interval: Option<i32>,
    #[serde(default)]
    pub recurrence_day: Option<i32>,
    #[serde(default)]
    pub recurrence_end_date: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub deleted_at: Option<Timestamp>,
}

impl From<SchedulePayload> for Schedule {
    fn from(p: SchedulePayload) -> Self {
        Self {
            id: p.id,
            note_id: p.note_id,
            start_date_time: p.start_date_time,
            end_date_time: p.end_date_time,
            recurrence_type: p.recurrence_type,
            recurrence_interval: p.recurrence_interval,
            recurrence_day: p.recurrence_day,
            recurrence_end_date: p.recurrence_end_date,
            created_at: p.created_at,
            updated_at: p.updated_at,
            deleted_at: p.deleted_at,
        }
    }
}

impl From<Schedule> for SchedulePayload {
    fn from(row: Schedule) -> Self {
        Self {
            id: row.id,
            note_id: row.note_id,
            start_date_time: row.start_date_time,
            end_date_time: row.end_date_time,
            recurrence_type: row.recurrence_type,
            recurrence_interval: row.recurrence_interval,
            recurrence_day: row.recurrence_day,
            recurrence_end_date: row.recurrence_end_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPayload {
    pub id: EntityId,
    #[serde(default)]
    pub note_id: Option<EntityId>,
    #[serde(default)]
    pub schedule_id: Option<EntityId>,
    #[serde(default)]
    pub offset_value: Option<i32>,
    #[serde(default, alias = "offsetType")]
    pub offset_unit: Option<ReminderOffsetUnit>,
    #[serde(default = "default_true")]
    pub is_notification: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub deleted_at: Option<Timestamp>,
}

impl ReminderPayload {
    pub fn into_row(self, account_id: AccountId) -> Reminder {
        Reminder {
            id: self.id,
            account_id,
            note_id: self.note_id,
            schedule_id: self.schedule_id,
            offset_value: self.offset_value,
            offset_unit: self.offset_unit,
            is_notification: self.is_notification,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

impl From<Reminder> for ReminderPayload {
    fn from(row: Reminder) -> Self {
        Self {
            id: row.id,
            note_id: row.note_id,
            schedule_id: row.schedule_id,
            offset_value: row.offset_value,
            offset_unit: row.offset_unit,
            is_notification: row.is_notification,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_fields_are_all_optional() {
        let req: SyncRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.last_sync_cursor.is_none());
        assert!(req.notes.is_empty());
        assert!(req.deletions.is_empty());
    }

    #[test]
    fn cursor_accepts_legacy_names() {
        for name in ["lastSyncCursor", "lastSyncAt", "lastSyncDate"] {
            let body = format!(r#"{{"{name}": "2024-02-01T10:00:00Z"}}"#);
            let req: SyncRequest = serde_json::from_str(&body).unwrap();
            assert!(req.last_sync_cursor.is_some(), "{name}");
        }
    }

    #[test]
    fn note_defaults_and_category_ids() {
        let req: SyncRequest = serde_json::from_value(json!({
            "notes": [{
                "id": "6f1c2a4e-8a0b-4c1e-9d7f-0a1b2c3d4e5f",
                "title": "Buy milk",
                "createdAt": "2024-02-01T10:00:00Z",
                "updatedAt": "2024-02-01T10:00:00Z",
                "categoryIds": []
            }]
        }))
        .unwrap();
        let note = &req.notes[0];
        assert_eq!(note.status, NoteStatus::Todo);
        assert!(!note.is_important);
        assert_eq!(note.category_ids, Some(vec![]));
    }

    #[test]
    fn reminder_accepts_offset_type_alias() {
        let reminder: ReminderPayload = serde_json::from_value(json!({
            "id": "6f1c2a4e-8a0b-4c1e-9d7f-0a1b2c3d4e5f",
            "offsetValue": 15,
            "offsetType": "minutes",
            "createdAt": "2024-02-01T10:00:00Z",
            "updatedAt": "2024-02-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(reminder.offset_unit, Some(ReminderOffsetUnit::Minutes));
        assert!(reminder.is_notification);
    }

    #[test]
    fn schedule_recurrence_uses_camel_case_names() {
        let json = serde_json::to_value(RecurrenceType::DayBasedMonthly).unwrap();
        assert_eq!(json, json!("dayBasedMonthly"));
    }

    #[test]
    fn link_deletion_directive_uses_composite_id() {
        let note_id = uuid::Uuid::new_v4();
        let category_id = uuid::Uuid::new_v4();
        let directive = DeletionDirective::from(&DeletionTarget::NoteCategory {
            note_id,
            category_id,
        });
        assert_eq!(directive.entity_type, "noteCategory");
        assert_eq!(directive.entity_id, format!("{note_id}:{category_id}"));
    }
}
