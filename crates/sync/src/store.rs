//! Transactional persistence boundary for the sync algorithm.
//!
//! A [`SyncStore`] opens a [`SyncSession`]; every read and write of one sync
//! call goes through that session, and nothing becomes visible to other
//! sessions until [`SyncSession::commit`]. Dropping a session without
//! committing discards its writes.
//!
//! Lookups by id are not scoped to an account: callers compare ownership
//! themselves so they can tell a missing row from a foreign one. Upserts of
//! owned kinds are guarded and return `false` when the id already belongs to
//! someone else.

use async_trait::async_trait;
use notesync_core::deletion::DeletionTarget;
use notesync_core::entity::Ownership;
use notesync_core::types::{AccountId, EntityId, Timestamp};
use notesync_db::models::{Account, Category, Note, NoteCategory, NoteType, Reminder, Schedule};

use crate::error::StoreError;

#[async_trait]
pub trait SyncStore: Send + Sync {
    type Session: SyncSession;

    /// Open a new session (a database transaction).
    async fn begin(&self) -> Result<Self::Session, StoreError>;
}

#[async_trait]
pub trait SyncSession: Send + Sized {
    // -- Accounts -----------------------------------------------------------

    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError>;

    async fn set_last_sync_at(&mut self, id: AccountId, at: Timestamp) -> Result<(), StoreError>;

    // -- Categories ---------------------------------------------------------

    async fn find_category(&mut self, id: EntityId) -> Result<Option<Category>, StoreError>;

    async fn upsert_category(&mut self, row: &Category) -> Result<bool, StoreError>;

    async fn categories_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Category>, StoreError>;

    /// Of `ids`, those naming live categories owned by `account_id`.
    async fn owned_live_category_ids(
        &mut self,
        account_id: AccountId,
        ids: &[EntityId],
    ) -> Result<Vec<EntityId>, StoreError>;

    // -- Note types ---------------------------------------------------------

    async fn find_note_type(&mut self, id: EntityId) -> Result<Option<NoteType>, StoreError>;

    /// Never writes a global row, nor over one.
    async fn upsert_note_type(&mut self, row: &NoteType) -> Result<bool, StoreError>;

    async fn global_note_types(&mut self) -> Result<Vec<NoteType>, StoreError>;

    /// Account-owned note types only.
    async fn note_types_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<NoteType>, StoreError>;

    // -- Notes --------------------------------------------------------------

    async fn find_note(&mut self, id: EntityId) -> Result<Option<Note>, StoreError>;

    async fn upsert_note(&mut self, row: &Note) -> Result<bool, StoreError>;

    async fn notes_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Note>, StoreError>;

    // -- Note/category links ------------------------------------------------

    async fn find_note_category(
        &mut self,
        note_id: EntityId,
        category_id: EntityId,
    ) -> Result<Option<NoteCategory>, StoreError>;

    /// The caller has checked ownership of both ends.
    async fn upsert_note_category(&mut self, row: &NoteCategory) -> Result<(), StoreError>;

    /// Every link of one note, tombstones included.
    async fn note_categories_for_note(
        &mut self,
        note_id: EntityId,
    ) -> Result<Vec<NoteCategory>, StoreError>;

    async fn live_note_categories(
        &mut self,
        note_ids: &[EntityId],
    ) -> Result<Vec<NoteCategory>, StoreError>;

    /// Links of the account's notes created or tombstoned after `cursor`.
    async fn note_categories_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<NoteCategory>, StoreError>;

    // -- Schedules ----------------------------------------------------------

    async fn find_schedule(&mut self, id: EntityId) -> Result<Option<Schedule>, StoreError>;

    /// Guarded by the account owning the stored schedule's note.
    async fn upsert_schedule(
        &mut self,
        account_id: AccountId,
        row: &Schedule,
    ) -> Result<bool, StoreError>;

    async fn schedules_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Schedule>, StoreError>;

    /// Every schedule of the given notes, tombstones included.
    async fn schedules_for_notes(
        &mut self,
        note_ids: &[EntityId],
    ) -> Result<Vec<Schedule>, StoreError>;

    // -- Reminders ----------------------------------------------------------

    async fn find_reminder(&mut self, id: EntityId) -> Result<Option<Reminder>, StoreError>;

    async fn upsert_reminder(&mut self, row: &Reminder) -> Result<bool, StoreError>;

    async fn reminders_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Reminder>, StoreError>;

    // -- Tombstones ---------------------------------------------------------

    /// Owner of the addressed row, following the note for schedules and
    /// links. `None` when the row (or its owning note) does not exist.
    async fn owner_of(&mut self, target: &DeletionTarget) -> Result<Option<Ownership>, StoreError>;

    /// Set the tombstone on a row owned by `account_id`. `updated_at` only
    /// moves forward, so the row's version never drops. Returns `false` if
    /// no owned row matched.
    async fn mark_deleted(
        &mut self,
        account_id: AccountId,
        target: &DeletionTarget,
        at: Timestamp,
    ) -> Result<bool, StoreError>;

    // -- Transaction --------------------------------------------------------

    async fn commit(self) -> Result<(), StoreError>;
}
