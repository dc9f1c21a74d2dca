//! Sync Orchestrator: the single entry point for one sync call.
//!
//! `ValidateAccount -> ApplyIncoming -> ResolveDeletions -> BuildFeed ->
//! AdvanceCursor -> Respond`, all inside one store session. Any error drops
//! the session, so a failed call leaves no partial writes behind.

use std::collections::HashMap;

use chrono::Utc;
use notesync_core::cursor::CursorStrategy;
use notesync_core::deletion::DeletionTarget;
use notesync_core::entity::{EntityKind, APPLY_ORDER};
use notesync_core::lww::coalesce_batch;
use notesync_core::retention::RetentionPolicy;
use notesync_core::types::{AccountId, Timestamp};
use notesync_db::models::{Category, NoteCategory, NoteType, Reminder, Schedule};

use crate::applier::{self, ApplyOutcome, IncomingNote, LinkChanges};
use crate::error::{SyncError, SyncResult};
use crate::feed;
use crate::payload::{SyncRequest, SyncResponse};
use crate::store::{SyncSession, SyncStore};
use crate::tombstone::{self, DeletionOutcome};

/// Tunables for the sync algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncConfig {
    pub cursor_strategy: CursorStrategy,
    pub retention: RetentionPolicy,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Applied/skipped counts for one entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// What one sync call did. Logged, never returned to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub applied: HashMap<EntityKind, KindCounts>,
    pub links: LinkChanges,
    pub deletions_marked: usize,
    pub deletions_not_found: usize,
    pub deletions_unauthorized: usize,
    pub directives_rejected: usize,
}

impl SyncReport {
    fn record(&mut self, kind: EntityKind, outcome: ApplyOutcome) {
        let counts = self.applied.entry(kind).or_default();
        match outcome {
            ApplyOutcome::Inserted => counts.inserted += 1,
            ApplyOutcome::Updated => counts.updated += 1,
            ApplyOutcome::Skipped(reason) => {
                counts.skipped += 1;
                tracing::debug!(kind = %kind, ?reason, "Skipped incoming record");
            }
        }
    }

    fn record_deletion(&mut self, outcome: DeletionOutcome) {
        match outcome {
            DeletionOutcome::Marked => self.deletions_marked += 1,
            DeletionOutcome::NotFound => self.deletions_not_found += 1,
            DeletionOutcome::Unauthorized => self.deletions_unauthorized += 1,
        }
    }

    pub fn counts(&self, kind: EntityKind) -> KindCounts {
        self.applied.get(&kind).copied().unwrap_or_default()
    }

    pub fn inserted(&self) -> usize {
        self.applied.values().map(|c| c.inserted).sum()
    }

    pub fn updated(&self) -> usize {
        self.applied.values().map(|c| c.updated).sum()
    }

    pub fn skipped(&self) -> usize {
        self.applied.values().map(|c| c.skipped).sum()
    }
}

/// Response plus the report of what happened.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub response: SyncResponse,
    pub report: SyncReport,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct SyncService<S> {
    store: S,
    config: SyncConfig,
}

impl<S: SyncStore> SyncService<S> {
    pub fn new(store: S, config: SyncConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one sync for the authenticated `account_id`.
    pub async fn synchronize(
        &self,
        account_id: AccountId,
        request: SyncRequest,
    ) -> SyncResult<SyncResponse> {
        let outcome = self.synchronize_at(account_id, request, Utc::now()).await?;
        Ok(outcome.response)
    }

    /// Run one sync with an explicit invocation time. Directive tombstones,
    /// link replacements and the invocation-time cursor all use `now`.
    pub async fn synchronize_at(
        &self,
        account_id: AccountId,
        request: SyncRequest,
        now: Timestamp,
    ) -> SyncResult<SyncOutcome> {
        let mut session = self.store.begin().await?;

        let account = session
            .find_account(account_id)
            .await?
            .ok_or(SyncError::AccountNotFound(account_id))?;

        let SyncRequest {
            last_sync_cursor: previous,
            mut categories,
            mut note_types,
            mut notes,
            mut note_categories,
            mut schedules,
            mut reminders,
            deletions,
        } = request;

        let mut report = SyncReport::default();

        // Batches are consumed in dependency order, never payload order.
        for kind in APPLY_ORDER {
            match kind {
                EntityKind::NoteType => {
                    let rows: Vec<NoteType> = std::mem::take(&mut note_types)
                        .into_iter()
                        .map(|p| p.into_row(account_id))
                        .collect();
                    for row in coalesce_batch(rows) {
                        let outcome =
                            applier::apply_note_type(&mut session, account_id, row).await?;
                        report.record(kind, outcome);
                    }
                }
                EntityKind::Category => {
                    let rows: Vec<Category> = std::mem::take(&mut categories)
                        .into_iter()
                        .map(|p| p.into_row(account_id))
                        .collect();
                    for row in coalesce_batch(rows) {
                        let outcome =
                            applier::apply_category(&mut session, account_id, row).await?;
                        report.record(kind, outcome);
                    }
                }
                EntityKind::Note => {
                    let rows: Vec<IncomingNote> = std::mem::take(&mut notes)
                        .into_iter()
                        .map(|p| {
                            let (note, category_ids) = p.into_row(account_id);
                            IncomingNote { note, category_ids }
                        })
                        .collect();
                    for IncomingNote { note, category_ids } in coalesce_batch(rows) {
                        let note_id = note.id;
                        let outcome = applier::apply_note(&mut session, account_id, note).await?;
                        report.record(kind, outcome);

                        // The category set follows the note: a losing note write
                        // leaves the stored links alone.
                        let Some(category_ids) = category_ids.filter(|_| outcome.is_written())
                        else {
                            continue;
                        };
                        let changes = applier::replace_note_categories(
                            &mut session,
                            account_id,
                            note_id,
                            &category_ids,
                            now,
                        )
                        .await?;
                        report.links.linked += changes.linked;
                        report.links.unlinked += changes.unlinked;
                    }
                }
                EntityKind::NoteCategory => {
                    let rows: Vec<NoteCategory> = std::mem::take(&mut note_categories)
                        .into_iter()
                        .map(NoteCategory::from)
                        .collect();
                    for row in coalesce_batch(rows) {
                        let outcome =
                            applier::apply_note_category(&mut session, account_id, row).await?;
                        report.record(kind, outcome);
                    }
                }
                EntityKind::Schedule => {
                    let rows: Vec<Schedule> = std::mem::take(&mut schedules)
                        .into_iter()
                        .map(Schedule::from)
                        .collect();
                    for row in coalesce_batch(rows) {
                        let outcome =
                            applier::apply_schedule(&mut session, account_id, row).await?;
                        report.record(kind, outcome);
                    }
                }
                EntityKind::Reminder => {
                    let rows: Vec<Reminder> = std::mem::take(&mut reminders)
                        .into_iter()
                        .map(|p| p.into_row(account_id))
                        .collect();
                    for row in coalesce_batch(rows) {
                        let outcome =
                            applier::apply_reminder(&mut session, account_id, row).await?;
                        report.record(kind, outcome);
                    }
                }
            }
        }

        for directive in deletions {
            match DeletionTarget::parse(&directive.entity_type, &directive.entity_id) {
                Ok(target) => {
                    let outcome =
                        tombstone::resolve_deletion(&mut session, account_id, &target, now)
                            .await?;
                    report.record_deletion(outcome);
                }
                Err(err) => {
                    tracing::warn!(
                        %account_id,
                        entity_type = %directive.entity_type,
                        entity_id = %directive.entity_id,
                        error = %err,
                        "Rejected malformed deletion directive"
                    );
                    report.directives_rejected += 1;
                }
            }
        }

        let full_resync = self.config.retention.requires_full_resync(previous, now);
        let feed_cursor = if full_resync { None } else { previous };
        let feed = feed::build_feed(&mut session, account_id, feed_cursor).await?;

        let new_cursor = self
            .config
            .cursor_strategy
            .advance(now, previous, feed.high_water);
        session.set_last_sync_at(account_id, new_cursor).await?;
        session.commit().await?;

        let response = feed.into_response(new_cursor, full_resync);

        tracing::info!(
            %account_id,
            client_cursor = ?previous,
            stored_cursor = ?account.last_sync_at,
            %new_cursor,
            strategy = %self.config.cursor_strategy,
            full_resync,
            inserted = report.inserted(),
            updated = report.updated(),
            skipped = report.skipped(),
            linked = report.links.linked,
            unlinked = report.links.unlinked,
            deletions_marked = report.deletions_marked,
            directives_rejected = report.directives_rejected,
            records_sent = response.record_count(),
            "Sync completed"
        );

        Ok(SyncOutcome { response, report })
    }
}
