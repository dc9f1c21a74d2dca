//! Postgres-backed sync store.
//!
//! Each session is one database transaction; every call delegates to the
//! zero-sized repositories in `notesync-db`.

use async_trait::async_trait;
use notesync_core::deletion::DeletionTarget;
use notesync_core::entity::Ownership;
use notesync_core::types::{AccountId, EntityId, Timestamp};
use notesync_db::models::{Account, Category, Note, NoteCategory, NoteType, Reminder, Schedule};
use notesync_db::repositories::{
    AccountRepo, CategoryRepo, NoteCategoryRepo, NoteRepo, NoteTypeRepo, ReminderRepo,
    ScheduleRepo,
};
use notesync_db::DbPool;
use sqlx::{Postgres, Transaction};

use crate::error::StoreError;
use crate::store::{SyncSession, SyncStore};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncStore for PgStore {
    type Session = PgSession;

    async fn begin(&self) -> Result<PgSession, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgSession { tx })
    }
}

pub struct PgSession {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SyncSession for PgSession {
    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(AccountRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn set_last_sync_at(&mut self, id: AccountId, at: Timestamp) -> Result<(), StoreError> {
        AccountRepo::set_last_sync_at(&mut *self.tx, id, at).await?;
        Ok(())
    }

    async fn find_category(&mut self, id: EntityId) -> Result<Option<Category>, StoreError> {
        Ok(CategoryRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn upsert_category(&mut self, row: &Category) -> Result<bool, StoreError> {
        Ok(CategoryRepo::upsert(&mut *self.tx, row).await?)
    }

    async fn categories_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Category>, StoreError> {
        Ok(CategoryRepo::changed_since(&mut *self.tx, account_id, cursor).await?)
    }

    async fn owned_live_category_ids(
        &mut self,
        account_id: AccountId,
        ids: &[EntityId],
    ) -> Result<Vec<EntityId>, StoreError> {
        Ok(CategoryRepo::owned_live_ids(&mut *self.tx, account_id, ids).await?)
    }

    async fn find_note_type(&mut self, id: EntityId) -> Result<Option<NoteType>, StoreError> {
        Ok(NoteTypeRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn upsert_note_type(&mut self, row: &NoteType) -> Result<bool, StoreError> {
        Ok(NoteTypeRepo::upsert(&mut *self.tx, row).await?)
    }

    async fn global_note_types(&mut self) -> Result<Vec<NoteType>, StoreError> {
        Ok(NoteTypeRepo::list_global(&mut *self.tx).await?)
    }

    async fn note_types_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<NoteType>, StoreError> {
        Ok(NoteTypeRepo::changed_since(&mut *self.tx, account_id, cursor).await?)
    }

    async fn find_note(&mut self, id: EntityId) -> Result<Option<Note>, StoreError> {
        Ok(NoteRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn upsert_note(&mut self, row: &Note) -> Result<bool, StoreError> {
        Ok(NoteRepo::upsert(&mut *self.tx, row).await?)
    }

    async fn notes_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Note>, StoreError> {
        Ok(NoteRepo::changed_since(&mut *self.tx, account_id, cursor).await?)
    }

    async fn find_note_category(
        &mut self,
        note_id: EntityId,
        category_id: EntityId,
    ) -> Result<Option<NoteCategory>, StoreError> {
        Ok(NoteCategoryRepo::find(&mut *self.tx, note_id, category_id).await?)
    }

    async fn upsert_note_category(&mut self, row: &NoteCategory) -> Result<(), StoreError> {
        Ok(NoteCategoryRepo::upsert(&mut *self.tx, row).await?)
    }

    async fn note_categories_for_note(
        &mut self,
        note_id: EntityId,
    ) -> Result<Vec<NoteCategory>, StoreError> {
        Ok(NoteCategoryRepo::list_for_note(&mut *self.tx, note_id).await?)
    }

    async fn live_note_categories(
        &mut self,
        note_ids: &[EntityId],
    ) -> Result<Vec<NoteCategory>, StoreError> {
        Ok(NoteCategoryRepo::live_for_notes(&mut *self.tx, note_ids).await?)
    }

    async fn note_categories_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<NoteCategory>, StoreError> {
        Ok(NoteCategoryRepo::changed_since(&mut *self.tx, account_id, cursor).await?)
    }

    async fn find_schedule(&mut self, id: EntityId) -> Result<Option<Schedule>, StoreError> {
        Ok(ScheduleRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn upsert_schedule(
        &mut self,
        account_id: AccountId,
        row: &Schedule,
    ) -> Result<bool, StoreError> {
        Ok(ScheduleRepo::upsert(&mut *self.tx, account_id, row).await?)
    }

    async fn schedules_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Schedule>, StoreError> {
        Ok(ScheduleRepo::changed_since(&mut *self.tx, account_id, cursor).await?)
    }

    async fn schedules_for_notes(
        &mut self,
        note_ids: &[EntityId],
    ) -> Result<Vec<Schedule>, StoreError> {
        Ok(ScheduleRepo::list_for_notes(&mut *self.tx, note_ids).await?)
    }

    async fn find_reminder(&mut self, id: EntityId) -> Result<Option<Reminder>, StoreError> {
        Ok(ReminderRepo::find_by_id(&mut *self.tx, id).await?)
    }

    async fn upsert_reminder(&mut self, row: &Reminder) -> Result<bool, StoreError> {
        Ok(ReminderRepo::upsert(&mut *self.tx, row).await?)
    }

    async fn reminders_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Reminder>, StoreError> {
        Ok(ReminderRepo::changed_since(&mut *self.tx, account_id, cursor).await?)
    }

    async fn owner_of(&mut self, target: &DeletionTarget) -> Result<Option<Ownership>, StoreError> {
        let conn = &mut *self.tx;
        let owner = match *target {
            DeletionTarget::Category(id) => CategoryRepo::find_by_id(conn, id)
                .await?
                .map(|row| Ownership::Account(row.account_id)),
            DeletionTarget::NoteType(id) => NoteTypeRepo::owner_of(conn, id).await?,
            DeletionTarget::Note(id) => NoteRepo::find_by_id(conn, id)
                .await?
                .map(|row| Ownership::Account(row.account_id)),
            DeletionTarget::NoteCategory {
                note_id,
                category_id,
            } => NoteCategoryRepo::owner_of(conn, note_id, category_id)
                .await?
                .map(Ownership::Account),
            DeletionTarget::Schedule(id) => {
                ScheduleRepo::owner_of(conn, id).await?.map(Ownership::Account)
            }
            DeletionTarget::Reminder(id) => ReminderRepo::find_by_id(conn, id)
                .await?
                .map(|row| Ownership::Account(row.account_id)),
        };
        Ok(owner)
    }

    async fn mark_deleted(
        &mut self,
        account_id: AccountId,
        target: &DeletionTarget,
        at: Timestamp,
    ) -> Result<bool, StoreError> {
        let conn = &mut *self.tx;
        let marked = match *target {
            DeletionTarget::Category(id) => {
                CategoryRepo::mark_deleted(conn, account_id, id, at).await?
            }
            DeletionTarget::NoteType(id) => {
                NoteTypeRepo::mark_deleted(conn, account_id, id, at).await?
            }
            DeletionTarget::Note(id) => NoteRepo::mark_deleted(conn, account_id, id, at).await?,
            DeletionTarget::NoteCategory {
                note_id,
                category_id,
            } => NoteCategoryRepo::mark_deleted(conn, account_id, note_id, category_id, at).await?,
            DeletionTarget::Schedule(id) => {
                ScheduleRepo::mark_deleted(conn, account_id, id, at).await?
            }
            DeletionTarget::Reminder(id) => {
                ReminderRepo::mark_deleted(conn, account_id, id, at).await?
            }
        };
        Ok(marked)
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
