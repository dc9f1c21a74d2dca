//! In-memory sync store.
//!
//! Mirrors the Postgres store's semantics (guarded upserts, ownership
//! through the note for links and schedules, strict cursor comparisons) so
//! the algorithm can be exercised without a database. A session holds the
//! store lock for its whole lifetime and works on a staged copy that only
//! replaces the shared state on commit.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use notesync_core::deletion::DeletionTarget;
use notesync_core::entity::Ownership;
use notesync_core::types::{AccountId, EntityId, Timestamp};
use notesync_db::models::{Account, Category, Note, NoteCategory, NoteType, Reminder, Schedule};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{SyncSession, SyncStore};

/// Full contents of an in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub accounts: HashMap<AccountId, Account>,
    pub categories: HashMap<EntityId, Category>,
    pub note_types: HashMap<EntityId, NoteType>,
    pub notes: HashMap<EntityId, Note>,
    pub note_categories: HashMap<(EntityId, EntityId), NoteCategory>,
    pub schedules: HashMap<EntityId, Schedule>,
    pub reminders: HashMap<EntityId, Reminder>,
}

impl MemoryState {
    fn note_owner(&self, note_id: EntityId) -> Option<AccountId> {
        self.notes.get(&note_id).map(|n| n.account_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new account.
    pub async fn create_account(&self, username: &str) -> Account {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            last_sync_at: None,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .await
            .accounts
            .insert(account.id, account.clone());
        account
    }

    /// Seed a global note type.
    pub async fn insert_global_note_type(&self, name: &str, at: Timestamp) -> NoteType {
        let row = NoteType {
            id: Uuid::new_v4(),
            owner: Ownership::Global,
            name: name.to_string(),
            created_at: at,
            updated_at: at,
            deleted_at: None,
        };
        self.state
            .lock()
            .await
            .note_types
            .insert(row.id, row.clone());
        row
    }

    /// Copy of the committed state.
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl SyncStore for MemoryStore {
    type Session = MemorySession;

    async fn begin(&self) -> Result<MemorySession, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(MemorySession { guard, staged })
    }
}

pub struct MemorySession {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

/// Strict "changed since" test shared by every kind.
fn changed_since(modified: Timestamp, deleted: Option<Timestamp>, cursor: Option<Timestamp>) -> bool {
    match cursor {
        None => true,
        Some(c) => modified > c || deleted.is_some_and(|d| d > c),
    }
}

fn sorted_by<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by_key(key);
    rows
}

#[async_trait]
impl SyncSession for MemorySession {
    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.staged.accounts.get(&id).cloned())
    }

    async fn set_last_sync_at(&mut self, id: AccountId, at: Timestamp) -> Result<(), StoreError> {
        if let Some(account) = self.staged.accounts.get_mut(&id) {
            account.last_sync_at = Some(at);
            account.updated_at = Utc::now();
        }
        Ok(())
    }

    // -- Categories ---------------------------------------------------------

    async fn find_category(&mut self, id: EntityId) -> Result<Option<Category>, StoreError> {
        Ok(self.staged.categories.get(&id).cloned())
    }

    async fn upsert_category(&mut self, row: &Category) -> Result<bool, StoreError> {
        if let Some(stored) = self.staged.categories.get(&row.id) {
            if stored.account_id != row.account_id {
                return Ok(false);
            }
        }
        self.staged.categories.insert(row.id, row.clone());
        Ok(true)
    }

    async fn categories_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Category>, StoreError> {
        let rows = self
            .staged
            .categories
            .values()
            .filter(|c| c.account_id == account_id)
            .filter(|c| changed_since(c.updated_at, c.deleted_at, cursor))
            .cloned()
            .collect();
        Ok(sorted_by(rows, |c: &Category| (c.updated_at, c.id)))
    }

    async fn owned_live_category_ids(
        &mut self,
        account_id: AccountId,
        ids: &[EntityId],
    ) -> Result<Vec<EntityId>, StoreError> {
        Ok(ids
            .iter()
            .copied()
            .filter(|id| {
                self.staged
                    .categories
                    .get(id)
                    .is_some_and(|c| c.account_id == account_id && c.deleted_at.is_none())
            })
            .collect())
    }

    // -- Note types ---------------------------------------------------------

    async fn find_note_type(&mut self, id: EntityId) -> Result<Option<NoteType>, StoreError> {
        Ok(self.staged.note_types.get(&id).cloned())
    }

    async fn upsert_note_type(&mut self, row: &NoteType) -> Result<bool, StoreError> {
        if row.owner.is_global() {
            return Ok(false);
        }
        if let Some(stored) = self.staged.note_types.get(&row.id) {
            if stored.owner != row.owner {
                return Ok(false);
            }
        }
        self.staged.note_types.insert(row.id, row.clone());
        Ok(true)
    }

    async fn global_note_types(&mut self) -> Result<Vec<NoteType>, StoreError> {
        let rows = self
            .staged
            .note_types
            .values()
            .filter(|nt| nt.owner.is_global())
            .cloned()
            .collect();
        Ok(sorted_by(rows, |nt: &NoteType| (nt.created_at, nt.id)))
    }

    async fn note_types_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<NoteType>, StoreError> {
        let rows = self
            .staged
            .note_types
            .values()
            .filter(|nt| nt.owner == Ownership::Account(account_id))
            .filter(|nt| changed_since(nt.updated_at, nt.deleted_at, cursor))
            .cloned()
            .collect();
        Ok(sorted_by(rows, |nt: &NoteType| (nt.updated_at, nt.id)))
    }

    // -- Notes --------------------------------------------------------------

    async fn find_note(&mut self, id: EntityId) -> Result<Option<Note>, StoreError> {
        Ok(self.staged.notes.get(&id).cloned())
    }

    async fn upsert_note(&mut self, row: &Note) -> Result<bool, StoreError> {
        if let Some(stored) = self.staged.notes.get(&row.id) {
            if stored.account_id != row.account_id {
                return Ok(false);
            }
        }
        self.staged.notes.insert(row.id, row.clone());
        Ok(true)
    }

    async fn notes_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Note>, StoreError> {
        let rows = self
            .staged
            .notes
            .values()
            .filter(|n| n.account_id == account_id)
            .filter(|n| changed_since(n.updated_at, n.deleted_at, cursor))
            .cloned()
            .collect();
        Ok(sorted_by(rows, |n: &Note| (n.updated_at, n.id)))
    }

    // -- Note/category links ------------------------------------------------

    async fn find_note_category(
        &mut self,
        note_id: EntityId,
        category_id: EntityId,
    ) -> Result<Option<NoteCategory>, StoreError> {
        Ok(self
            .staged
            .note_categories
            .get(&(note_id, category_id))
            .cloned())
    }

    async fn upsert_note_category(&mut self, row: &NoteCategory) -> Result<(), StoreError> {
        self.staged
            .note_categories
            .insert((row.note_id, row.category_id), row.clone());
        Ok(())
    }

    async fn note_categories_for_note(
        &mut self,
        note_id: EntityId,
    ) -> Result<Vec<NoteCategory>, StoreError> {
        let rows = self
            .staged
            .note_categories
            .values()
            .filter(|l| l.note_id == note_id)
            .cloned()
            .collect();
        Ok(sorted_by(rows, |l: &NoteCategory| (l.created_at, l.category_id)))
    }

    async fn live_note_categories(
        &mut self,
        note_ids: &[EntityId],
    ) -> Result<Vec<NoteCategory>, StoreError> {
        let rows = self
            .staged
            .note_categories
            .values()
            .filter(|l| l.deleted_at.is_none() && note_ids.contains(&l.note_id))
            .cloned()
            .collect();
        Ok(sorted_by(rows, |l: &NoteCategory| (l.created_at, l.category_id)))
    }

    async fn note_categories_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<NoteCategory>, StoreError> {
        let rows = self
            .staged
            .note_categories
            .values()
            .filter(|l| self.staged.note_owner(l.note_id) == Some(account_id))
            .filter(|l| changed_since(l.created_at, l.deleted_at, cursor))
            .cloned()
            .collect();
        Ok(sorted_by(rows, |l: &NoteCategory| (l.created_at, l.note_id, l.category_id)))
    }

    // -- Schedules ----------------------------------------------------------

    async fn find_schedule(&mut self, id: EntityId) -> Result<Option<Schedule>, StoreError> {
        Ok(self.staged.schedules.get(&id).cloned())
    }

    async fn upsert_schedule(
        &mut self,
        account_id: AccountId,
        row: &Schedule,
    ) -> Result<bool, StoreError> {
        if let Some(stored) = self.staged.schedules.get(&row.id) {
            if self.staged.note_owner(stored.note_id) != Some(account_id) {
                return Ok(false);
            }
        }
        self.staged.schedules.insert(row.id, row.clone());
        Ok(true)
    }

    async fn schedules_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Schedule>, StoreError> {
        let rows = self
            .staged
            .schedules
            .values()
            .filter(|s| self.staged.note_owner(s.note_id) == Some(account_id))
            .filter(|s| changed_since(s.updated_at, s.deleted_at, cursor))
            .cloned()
            .collect();
        Ok(sorted_by(rows, |s: &Schedule| (s.updated_at, s.id)))
    }

    async fn schedules_for_notes(
        &mut self,
        note_ids: &[EntityId],
    ) -> Result<Vec<Schedule>, StoreError> {
        let rows = self
            .staged
            .schedules
            .values()
            .filter(|s| note_ids.contains(&s.note_id))
            .cloned()
            .collect();
        Ok(sorted_by(rows, |s: &Schedule| (s.updated_at, s.id)))
    }

    // -- Reminders ----------------------------------------------------------

    async fn find_reminder(&mut self, id: EntityId) -> Result<Option<Reminder>, StoreError> {
        Ok(self.staged.reminders.get(&id).cloned())
    }

    async fn upsert_reminder(&mut self, row: &Reminder) -> Result<bool, StoreError> {
        if let Some(stored) = self.staged.reminders.get(&row.id) {
            if stored.account_id != row.account_id {
                return Ok(false);
            }
        }
        self.staged.reminders.insert(row.id, row.clone());
        Ok(true)
    }

    async fn reminders_changed_since(
        &mut self,
        account_id: AccountId,
        cursor: Option<Timestamp>,
    ) -> Result<Vec<Reminder>, StoreError> {
        let rows = self
            .staged
            .reminders
            .values()
            .filter(|r| r.account_id == account_id)
            .filter(|r| changed_since(r.updated_at, r.deleted_at, cursor))
            .cloned()
            .collect();
        Ok(sorted_by(rows, |r: &Reminder| (r.updated_at, r.id)))
    }

    // -- Tombstones ---------------------------------------------------------

    async fn owner_of(&mut self, target: &DeletionTarget) -> Result<Option<Ownership>, StoreError> {
        let state = &self.staged;
        let owner = match *target {
            DeletionTarget::Category(id) => state
                .categories
                .get(&id)
                .map(|c| Ownership::Account(c.account_id)),
            DeletionTarget::NoteType(id) => state.note_types.get(&id).map(|nt| nt.owner),
            DeletionTarget::Note(id) => state.note_owner(id).map(Ownership::Account),
            DeletionTarget::NoteCategory {
                note_id,
                category_id,
            } => state
                .note_categories
                .get(&(note_id, category_id))
                .and_then(|l| state.note_owner(l.note_id))
                .map(Ownership::Account),
            DeletionTarget::Schedule(id) => state
                .schedules
                .get(&id)
                .and_then(|s| state.note_owner(s.note_id))
                .map(Ownership::Account),
            DeletionTarget::Reminder(id) => state
                .reminders
                .get(&id)
                .map(|r| Ownership::Account(r.account_id)),
        };
        Ok(owner)
    }

    async fn mark_deleted(
        &mut self,
        account_id: AccountId,
        target: &DeletionTarget,
        at: Timestamp,
    ) -> Result<bool, StoreError> {
        let owned = self.owner_of(target).await? == Some(Ownership::Account(account_id));
        if !owned {
            return Ok(false);
        }

        let state = &mut self.staged;
        let marked = match *target {
            DeletionTarget::Category(id) => state.categories.get_mut(&id).map(|row| {
                row.deleted_at = Some(at);
                row.updated_at = row.updated_at.max(at);
            }),
            DeletionTarget::NoteType(id) => state.note_types.get_mut(&id).map(|row| {
                row.deleted_at = Some(at);
                row.updated_at = row.updated_at.max(at);
            }),
            DeletionTarget::Note(id) => state.notes.get_mut(&id).map(|row| {
                row.deleted_at = Some(at);
                row.updated_at = row.updated_at.max(at);
            }),
            DeletionTarget::NoteCategory {
                note_id,
                category_id,
            } => state
                .note_categories
                .get_mut(&(note_id, category_id))
                .map(|row| row.deleted_at = Some(at)),
            DeletionTarget::Schedule(id) => state.schedules.get_mut(&id).map(|row| {
                row.deleted_at = Some(at);
                row.updated_at = row.updated_at.max(at);
            }),
            DeletionTarget::Reminder(id) => state.reminders.get_mut(&id).map(|row| {
                row.deleted_at = Some(at);
                row.updated_at = row.updated_at.max(at);
            }),
        };
        Ok(marked.is_some())
    }

    // -- Transaction --------------------------------------------------------

    async fn commit(mut self) -> Result<(), StoreError> {
        *self.guard = self.staged;
        Ok(())
    }
}
