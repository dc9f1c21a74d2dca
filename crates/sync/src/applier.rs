//! Change Applier: merges one incoming record into server state.
//!
//! Every kind follows the same sequence: check the references the record
//! makes (nullifying or rejecting per the entity graph), refuse ids that
//! belong to another account, then let last-write-wins decide between the
//! stored row and the incoming one.

use std::collections::HashSet;

use notesync_core::entity::{DanglingReference, EntityKind};
use notesync_core::lww::{self, Resolution, Versioned};
use notesync_core::types::{AccountId, EntityId, Timestamp};
use notesync_db::models::{Category, Note, NoteCategory, NoteType, Reminder, Schedule};

use crate::error::StoreError;
use crate::store::SyncSession;

/// Result of applying one incoming record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Inserted,
    Updated,
    Skipped(SkipReason),
}

impl ApplyOutcome {
    /// Whether the incoming record was written.
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Inserted | Self::Updated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The stored version is as new or newer.
    Stale,
    /// The id belongs to another account, or to a global row.
    ForeignOwner,
    /// A rejecting reference did not resolve to a row the account owns.
    DanglingReference(EntityKind),
}

/// A note together with the category set submitted with it.
#[derive(Debug, Clone)]
pub struct IncomingNote {
    pub note: Note,
    pub category_ids: Option<Vec<EntityId>>,
}

impl Versioned for IncomingNote {
    type Key = EntityId;

    fn key(&self) -> EntityId {
        self.note.id
    }

    fn modified_at(&self) -> Timestamp {
        self.note.updated_at
    }

    fn deleted_at(&self) -> Option<Timestamp> {
        self.note.deleted_at
    }

    fn raise_version(&mut self, to: Timestamp) {
        self.note.raise_version(to);
    }
}

/// Links added and removed by a category-set replacement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkChanges {
    pub linked: usize,
    pub unlinked: usize,
}

/// Policy for an unresolved reference from `kind` to `target`.
fn on_dangling(kind: EntityKind, target: EntityKind) -> DanglingReference {
    kind.on_dangling(target).unwrap_or(DanglingReference::Reject)
}

fn dangling(target: EntityKind) -> ApplyOutcome {
    ApplyOutcome::Skipped(SkipReason::DanglingReference(target))
}

fn written(resolution: Resolution) -> ApplyOutcome {
    match resolution {
        Resolution::Insert => ApplyOutcome::Inserted,
        Resolution::Overwrite => ApplyOutcome::Updated,
        Resolution::Keep => ApplyOutcome::Skipped(SkipReason::Stale),
    }
}

// ---------------------------------------------------------------------------
// Reference checks
// ---------------------------------------------------------------------------

async fn owns_note<S: SyncSession>(
    session: &mut S,
    account_id: AccountId,
    note_id: EntityId,
) -> Result<bool, StoreError> {
    Ok(session
        .find_note(note_id)
        .await?
        .is_some_and(|n| n.account_id == account_id))
}

async fn owns_category<S: SyncSession>(
    session: &mut S,
    account_id: AccountId,
    category_id: EntityId,
) -> Result<bool, StoreError> {
    Ok(session
        .find_category(category_id)
        .await?
        .is_some_and(|c| c.account_id == account_id))
}

/// Schedules are owned through their note.
async fn owns_schedule<S: SyncSession>(
    session: &mut S,
    account_id: AccountId,
    schedule_id: EntityId,
) -> Result<bool, StoreError> {
    match session.find_schedule(schedule_id).await? {
        Some(schedule) => owns_note(session, account_id, schedule.note_id).await,
        None => Ok(false),
    }
}

// ---------------------------------------------------------------------------
// Per-kind apply
// ---------------------------------------------------------------------------

pub async fn apply_category<S: SyncSession>(
    session: &mut S,
    account_id: AccountId,
    row: Category,
) -> Result<ApplyOutcome, StoreError> {
    let stored = session.find_category(row.id).await?;
    if stored.as_ref().is_some_and(|s| s.account_id != account_id) {
        return Ok(ApplyOutcome::Skipped(SkipReason::ForeignOwner));
    }

    let resolution = lww::resolve(stored.as_ref(), &row);
    if resolution == Resolution::Keep {
        return Ok(written(resolution));
    }
    if !session.upsert_category(&row).await? {
        return Ok(ApplyOutcome::Skipped(SkipReason::ForeignOwner));
    }
    Ok(written(resolution))
}

pub async fn apply_note_type<S: SyncSession>(
    session: &mut S,
    account_id: AccountId,
    row: NoteType,
) -> Result<ApplyOutcome, StoreError> {
    let stored = session.find_note_type(row.id).await?;
    if stored
        .as_ref()
        .is_some_and(|s| !s.owner.is_writable_by(account_id))
    {
        return Ok(ApplyOutcome::Skipped(SkipReason::ForeignOwner));
    }

    let resolution = lww::resolve(stored.as_ref(), &row);
    if resolution == Resolution::Keep {
        return Ok(written(resolution));
    }
    if !session.upsert_note_type(&row).await? {
        return Ok(ApplyOutcome::Skipped(SkipReason::ForeignOwner));
    }
    Ok(written(resolution))
}

/// Apply a note. The note type reference is nullified when it does not name
/// a global type or one of the account's own.
pub async fn apply_note<S: SyncSession>(
    session: &mut S,
    account_id: AccountId,
    mut row: Note,
) -> Result<ApplyOutcome, StoreError> {
    if let Some(note_type_id) = row.note_type_id {
        let visible = session
            .find_note_type(note_type_id)
            .await?
            .is_some_and(|nt| nt.owner.is_visible_to(account_id));
        if !visible {
            match on_dangling(EntityKind::Note, EntityKind::NoteType) {
                DanglingReference::Nullify => {
                    tracing::debug!(note_id = %row.id, %note_type_id, "Nullified dangling note type reference");
                    row.note_type_id = None;
                }
                DanglingReference::Reject => return Ok(dangling(EntityKind::NoteType)),
            }
        }
    }

    let stored = session.find_note(row.id).await?;
    if stored.as_ref().is_some_and(|s| s.account_id != account_id) {
        return Ok(ApplyOutcome::Skipped(SkipReason::ForeignOwner));
    }

    let resolution = lww::resolve(stored.as_ref(), &row);
    if resolution == Resolution::Keep {
        return Ok(written(resolution));
    }
    if !session.upsert_note(&row).await? {
        return Ok(ApplyOutcome::Skipped(SkipReason::ForeignOwner));
    }
    Ok(written(resolution))
}

/// Apply a link record. Both ends must exist and belong to the account.
pub async fn apply_note_category<S: SyncSession>(
    session: &mut S,
    account_id: AccountId,
    row: NoteCategory,
) -> Result<ApplyOutcome, StoreError> {
    let note_owned = owns_note(session, account_id, row.note_id).await?;
    let category_owned = owns_category(session, account_id, row.category_id).await?;
    for (target, owned) in [
        (EntityKind::Note, note_owned),
        (EntityKind::Category, category_owned),
    ] {
        if !owned && on_dangling(EntityKind::NoteCategory, target) == DanglingReference::Reject {
            return Ok(dangling(target));
        }
    }

    let stored = session
        .find_note_category(row.note_id, row.category_id)
        .await?;
    let resolution = lww::resolve(stored.as_ref(), &row);
    if resolution != Resolution::Keep {
        session.upsert_note_category(&row).await?;
    }
    Ok(written(resolution))
}

/// Apply a schedule. Rejected unless its note belongs to the account.
pub async fn apply_schedule<S: SyncSession>(
    session: &mut S,
    account_id: AccountId,
    row: Schedule,
) -> Result<ApplyOutcome, StoreError> {
    if !owns_note(session, account_id, row.note_id).await?
        && on_dangling(EntityKind::Schedule, EntityKind::Note) == DanglingReference::Reject
    {
        return Ok(dangling(EntityKind::Note));
    }

    let stored = session.find_schedule(row.id).await?;
    if let Some(stored) = &stored {
        if !owns_note(session, account_id, stored.note_id).await? {
            return Ok(ApplyOutcome::Skipped(SkipReason::ForeignOwner));
        }
    }

    let resolution = lww::resolve(stored.as_ref(), &row);
    if resolution == Resolution::Keep {
        return Ok(written(resolution));
    }
    if !session.upsert_schedule(account_id, &row).await? {
        return Ok(ApplyOutcome::Skipped(SkipReason::ForeignOwner));
    }
    Ok(written(resolution))
}

/// Apply a reminder. Schedule and note references that do not resolve to
/// rows the account owns are cleared.
pub async fn apply_reminder<S: SyncSession>(
    session: &mut S,
    account_id: AccountId,
    mut row: Reminder,
) -> Result<ApplyOutcome, StoreError> {
    if let Some(schedule_id) = row.schedule_id {
        if !owns_schedule(session, account_id, schedule_id).await? {
            match on_dangling(EntityKind::Reminder, EntityKind::Schedule) {
                DanglingReference::Nullify => {
                    tracing::debug!(reminder_id = %row.id, %schedule_id, "Nullified dangling schedule reference");
                    row.schedule_id = None;
                }
                DanglingReference::Reject => return Ok(dangling(EntityKind::Schedule)),
            }
        }
    }
    if let Some(note_id) = row.note_id {
        if !owns_note(session, account_id, note_id).await? {
            match on_dangling(EntityKind::Reminder, EntityKind::Note) {
                DanglingReference::Nullify => {
                    tracing::debug!(reminder_id = %row.id, %note_id, "Nullified dangling note reference");
                    row.note_id = None;
                }
                DanglingReference::Reject => return Ok(dangling(EntityKind::Note)),
            }
        }
    }

    let stored = session.find_reminder(row.id).await?;
    if stored.as_ref().is_some_and(|s| s.account_id != account_id) {
        return Ok(ApplyOutcome::Skipped(SkipReason::ForeignOwner));
    }

    let resolution = lww::resolve(stored.as_ref(), &row);
    if resolution == Resolution::Keep {
        return Ok(written(resolution));
    }
    if !session.upsert_reminder(&row).await? {
        return Ok(ApplyOutcome::Skipped(SkipReason::ForeignOwner));
    }
    Ok(written(resolution))
}

// ---------------------------------------------------------------------------
// Category set replacement
// ---------------------------------------------------------------------------

/// Make the live links of `note_id` exactly `category_ids`.
///
/// Ids that are not live categories owned by the account are dropped.
/// Links outside the set are tombstoned at `now`; links in the set that are
/// missing or tombstoned are (re)created with `created_at = now`. Must run
/// after the note row itself has been written.
pub async fn replace_note_categories<S: SyncSession>(
    session: &mut S,
    account_id: AccountId,
    note_id: EntityId,
    category_ids: &[EntityId],
    now: Timestamp,
) -> Result<LinkChanges, StoreError> {
    let wanted: HashSet<EntityId> = session
        .owned_live_category_ids(account_id, category_ids)
        .await?
        .into_iter()
        .collect();
    let existing = session.note_categories_for_note(note_id).await?;
    let mut changes = LinkChanges::default();

    for link in &existing {
        if link.deleted_at.is_none() && !wanted.contains(&link.category_id) {
            let tombstone = NoteCategory {
                deleted_at: Some(now),
                ..link.clone()
            };
            session.upsert_note_category(&tombstone).await?;
            changes.unlinked += 1;
        }
    }

    // Keep the submitted order for deterministic creation.
    let mut seen = HashSet::new();
    for category_id in category_ids {
        if !wanted.contains(category_id) || !seen.insert(*category_id) {
            continue;
        }
        let live = existing
            .iter()
            .any(|l| l.category_id == *category_id && l.deleted_at.is_none());
        if !live {
            session
                .upsert_note_category(&NoteCategory::live(note_id, *category_id, now))
                .await?;
            changes.linked += 1;
        }
    }

    Ok(changes)
}

