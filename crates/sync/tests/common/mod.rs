//! Shared helpers for sync integration tests.

#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use notesync_core::types::{AccountId, EntityId, Timestamp};
use notesync_db::models::NoteStatus;
use notesync_sync::memory::MemoryStore;
use notesync_sync::payload::{
    CategoryPayload, DeletionDirective, NoteCategoryPayload, NotePayload, ReminderPayload,
    SchedulePayload, SyncRequest,
};
use notesync_sync::{SyncConfig, SyncOutcome, SyncService};
use uuid::Uuid;

/// Minutes after a fixed epoch.
pub fn t(mins: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap() + Duration::minutes(mins)
}

pub fn id() -> EntityId {
    Uuid::new_v4()
}

pub struct Harness {
    pub store: MemoryStore,
    pub service: SyncService<MemoryStore>,
    pub account_id: AccountId,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config(SyncConfig::default()).await
    }

    pub async fn with_config(config: SyncConfig) -> Self {
        let store = MemoryStore::new();
        let account = store.create_account("alice").await;
        let service = SyncService::new(store.clone(), config);
        Self {
            store,
            service,
            account_id: account.id,
        }
    }

    /// Sync as the harness account at time `now`.
    pub async fn sync(&self, request: SyncRequest, now: Timestamp) -> SyncOutcome {
        self.sync_as(self.account_id, request, now).await
    }

    pub async fn sync_as(
        &self,
        account_id: AccountId,
        request: SyncRequest,
        now: Timestamp,
    ) -> SyncOutcome {
        self.service
            .synchronize_at(account_id, request, now)
            .await
            .expect("sync should succeed")
    }

    /// Pull-only sync from `cursor`.
    pub async fn pull(&self, cursor: Option<Timestamp>, now: Timestamp) -> SyncOutcome {
        self.sync(
            SyncRequest {
                last_sync_cursor: cursor,
                ..Default::default()
            },
            now,
        )
        .await
    }
}

// ---------------------------------------------------------------------------
// Payload builders
// ---------------------------------------------------------------------------

pub fn category(id: EntityId, name: &str, at: Timestamp) -> CategoryPayload {
    CategoryPayload {
        id,
        name: name.to_string(),
        created_at: at,
        updated_at: at,
        deleted_at: None,
    }
}

pub fn note(id: EntityId, title: &str, at: Timestamp) -> NotePayload {
    NotePayload {
        id,
        title: title.to_string(),
        content: None,
        note_type_id: None,
        is_important: false,
        status: NoteStatus::Todo,
        created_at: at,
        updated_at: at,
        deleted_at: None,
        category_ids: None,
    }
}

pub fn note_in(id: EntityId, title: &str, at: Timestamp, categories: &[EntityId]) -> NotePayload {
    NotePayload {
        category_ids: Some(categories.to_vec()),
        ..note(id, title, at)
    }
}

pub fn link(note_id: EntityId, category_id: EntityId, at: Timestamp) -> NoteCategoryPayload {
    NoteCategoryPayload {
        note_id,
        category_id,
        created_at: at,
        deleted_at: None,
    }
}

pub fn schedule(id: EntityId, note_id: EntityId, at: Timestamp) -> SchedulePayload {
    SchedulePayload {
        id,
        note_id,
        start_date_time: Some(at),
        end_date_time: None,
        recurrence_type: None,
        recurrence_interval: None,
        recurrence_day: None,
        recurrence_end_date: None,
        created_at: at,
        updated_at: at,
        deleted_at: None,
    }
}

pub fn reminder(id: EntityId, note_id: Option<EntityId>, at: Timestamp) -> ReminderPayload {
    ReminderPayload {
        id,
        note_id,
        schedule_id: None,
        offset_value: Some(10),
        offset_unit: None,
        is_notification: true,
        created_at: at,
        updated_at: at,
        deleted_at: None,
    }
}

pub fn delete(entity_type: &str, entity_id: impl ToString) -> DeletionDirective {
    DeletionDirective {
        entity_type: entity_type.to_string(),
        entity_id: entity_id.to_string(),
    }
}
