//! Change Feed Builder: what the client has not seen since its cursor.
//!
//! Tombstones travel inline (the row with `deletedAt` set) for every kind
//! except links. Live links changed since the cursor are listed as records;
//! tombstoned links are reported as deletion directives, since a link the
//! client never saw has nothing to carry `deletedAt` on.

use std::collections::{HashMap, HashSet};

use notesync_core::cursor::HighWaterMark;
use notesync_core::deletion::DeletionTarget;
use notesync_core::lww::Versioned;
use notesync_core::types::{AccountId, EntityId, Timestamp};
use notesync_db::models::{Category, Note, NoteCategory, NoteType, Reminder, Schedule};

use crate::error::StoreError;
use crate::payload::{
    CategoryPayload, DeletionDirective, NotePayload, NoteCategoryPayload, NoteTypePayload,
    ReminderPayload, SchedulePayload, SyncResponse,
};
use crate::store::SyncSession;

/// Rows selected for one response.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub categories: Vec<Category>,
    /// Global rows in full, then the account's own changed rows.
    pub note_types: Vec<NoteType>,
    /// Each note with the ids of its live links.
    pub notes: Vec<(Note, Vec<EntityId>)>,
    /// Live links created since the cursor.
    pub note_categories: Vec<NoteCategory>,
    pub schedules: Vec<Schedule>,
    pub reminders: Vec<Reminder>,
    /// Link tombstones since the cursor.
    pub deletions: Vec<DeletionTarget>,
    /// Newest version among every row above.
    pub high_water: HighWaterMark,
}

impl Feed {
    pub fn into_response(self, new_cursor: Timestamp, full_resync: bool) -> SyncResponse {
        SyncResponse {
            new_cursor,
            full_resync,
            categories: self.categories.into_iter().map(CategoryPayload::from).collect(),
            note_types: self.note_types.into_iter().map(NoteTypePayload::from).collect(),
            notes: self
                .notes
                .into_iter()
                .map(|(note, category_ids)| NotePayload::from_row(note, category_ids))
                .collect(),
            note_categories: self
                .note_categories
                .into_iter()
                .map(NoteCategoryPayload::from)
                .collect(),
            schedules: self.schedules.into_iter().map(SchedulePayload::from).collect(),
            reminders: self.reminders.into_iter().map(ReminderPayload::from).collect(),
            deletions: self.deletions.iter().map(DeletionDirective::from).collect(),
        }
    }
}

fn observe_all<T: Versioned>(high_water: &mut HighWaterMark, rows: &[T]) {
    for row in rows {
        high_water.observe(row.version());
    }
}

/// Build the feed for `account_id`. A `None` cursor yields a full snapshot,
/// tombstones included.
pub async fn build_feed<S: SyncSession>(
    session: &mut S,
    account_id: AccountId,
    cursor: Option<Timestamp>,
) -> Result<Feed, StoreError> {
    let mut feed = Feed::default();

    let mut note_types = session.global_note_types().await?;
    note_types.extend(session.note_types_changed_since(account_id, cursor).await?);
    feed.note_types = note_types;

    feed.categories = session.categories_changed_since(account_id, cursor).await?;

    // Notes and the live category ids each one carries.
    let notes = session.notes_changed_since(account_id, cursor).await?;
    let note_ids: Vec<EntityId> = notes.iter().map(|n| n.id).collect();
    let mut categories_by_note: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
    for link in session.live_note_categories(&note_ids).await? {
        categories_by_note
            .entry(link.note_id)
            .or_default()
            .push(link.category_id);
    }
    feed.notes = notes
        .into_iter()
        .map(|note| {
            let ids = categories_by_note.remove(&note.id).unwrap_or_default();
            (note, ids)
        })
        .collect();

    for link in session
        .note_categories_changed_since(account_id, cursor)
        .await?
    {
        feed.high_water.observe(link.version());
        if link.is_tombstone() {
            feed.deletions.push(DeletionTarget::NoteCategory {
                note_id: link.note_id,
                category_id: link.category_id,
            });
        } else {
            feed.note_categories.push(link);
        }
    }

    // Changed schedules plus every schedule of a note in this response, so a
    // newly seen note arrives with its schedules.
    let mut schedules = session.schedules_changed_since(account_id, cursor).await?;
    let mut seen: HashSet<EntityId> = schedules.iter().map(|s| s.id).collect();
    for schedule in session.schedules_for_notes(&note_ids).await? {
        if seen.insert(schedule.id) {
            schedules.push(schedule);
        }
    }
    feed.schedules = schedules;

    feed.reminders = session.reminders_changed_since(account_id, cursor).await?;

    observe_all(&mut feed.high_water, &feed.note_types);
    observe_all(&mut feed.high_water, &feed.categories);
    for (note, _) in &feed.notes {
        feed.high_water.observe(note.version());
    }
    observe_all(&mut feed.high_water, &feed.schedules);
    observe_all(&mut feed.high_water, &feed.reminders);

    Ok(feed)
}
