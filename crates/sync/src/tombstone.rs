//! Tombstone Resolver: applies explicit deletion directives.
//!
//! Records that arrive with their own `deletedAt` go through the applier
//! like any other write. Directives are different: they stamp the tombstone
//! at server time without any timestamp comparison, provided the account
//! owns the target.

use notesync_core::deletion::DeletionTarget;
use notesync_core::types::{AccountId, Timestamp};

use crate::error::StoreError;
use crate::store::SyncSession;

/// Result of one deletion directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    Marked,
    /// No such row, or (for schedules and links) no owning note.
    NotFound,
    /// The row belongs to another account or is a global note type.
    Unauthorized,
}

/// Tombstone `target` at `now` on behalf of `account_id`.
pub async fn resolve_deletion<S: SyncSession>(
    session: &mut S,
    account_id: AccountId,
    target: &DeletionTarget,
    now: Timestamp,
) -> Result<DeletionOutcome, StoreError> {
    let outcome = match session.owner_of(target).await? {
        None => DeletionOutcome::NotFound,
        Some(owner) if !owner.is_writable_by(account_id) => DeletionOutcome::Unauthorized,
        Some(_) => {
            if session.mark_deleted(account_id, target, now).await? {
                DeletionOutcome::Marked
            } else {
                DeletionOutcome::NotFound
            }
        }
    };

    tracing::debug!(%account_id, %target, ?outcome, "Resolved deletion directive");
    Ok(outcome)
}
