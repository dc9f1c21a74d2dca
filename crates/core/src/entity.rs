//! Synchronizable entity kinds and the dependency graph between them.
//!
//! The graph decides two things: the fixed order in which a client batch is
//! applied (so a foreign key always points at a row that was written first)
//! and what happens when a submitted reference does not resolve.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::AccountId;

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

/// The six entity kinds a client replica can hold.
///
/// Serialized in camelCase (`"noteCategory"`), which is also the closed set
/// of `entityType` values accepted in deletion directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Category,
    NoteType,
    Note,
    NoteCategory,
    Schedule,
    Reminder,
}

/// Topological order used when applying a client batch.
///
/// Every kind appears after all of its [`EntityKind::dependencies`].
pub const APPLY_ORDER: [EntityKind; 6] = [
    EntityKind::NoteType,
    EntityKind::Category,
    EntityKind::Note,
    EntityKind::NoteCategory,
    EntityKind::Schedule,
    EntityKind::Reminder,
];

/// What happens to a record whose foreign key does not resolve to a row the
/// account can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DanglingReference {
    /// The reference is cleared and the record is stored without it.
    Nullify,
    /// The record is skipped; the rest of the batch proceeds.
    Reject,
}

impl EntityKind {
    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::NoteType => "noteType",
            Self::Note => "note",
            Self::NoteCategory => "noteCategory",
            Self::Schedule => "schedule",
            Self::Reminder => "reminder",
        }
    }

    /// Kinds this kind holds a foreign key to.
    pub fn dependencies(self) -> &'static [EntityKind] {
        match self {
            Self::Category | Self::NoteType => &[],
            Self::Note => &[Self::NoteType],
            Self::NoteCategory => &[Self::Note, Self::Category],
            Self::Schedule => &[Self::Note],
            Self::Reminder => &[Self::Schedule, Self::Note],
        }
    }

    /// Policy for an unresolved reference from `self` to `target`.
    ///
    /// Returns `None` when `target` is not a dependency of `self`.
    pub fn on_dangling(self, target: EntityKind) -> Option<DanglingReference> {
        use DanglingReference::{Nullify, Reject};
        match (self, target) {
            (Self::Note, Self::NoteType) => Some(Nullify),
            (Self::NoteCategory, Self::Note | Self::Category) => Some(Reject),
            (Self::Schedule, Self::Note) => Some(Reject),
            (Self::Reminder, Self::Schedule | Self::Note) => Some(Nullify),
            _ => None,
        }
    }

    /// Whether the identity is the composite `(noteId, categoryId)` pair.
    pub fn has_composite_key(self) -> bool {
        matches!(self, Self::NoteCategory)
    }

    /// Whether rows carry an `updated_at` column. The link entity does not;
    /// its recency is judged by `created_at`.
    pub fn has_updated_at(self) -> bool {
        !matches!(self, Self::NoteCategory)
    }

    /// Position of this kind in [`APPLY_ORDER`].
    pub fn apply_rank(self) -> usize {
        APPLY_ORDER
            .iter()
            .position(|k| *k == self)
            .unwrap_or(APPLY_ORDER.len())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        APPLY_ORDER
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown entity type: '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

/// Who owns a row.
///
/// Note types are the only kind that can be [`Ownership::Global`]: server
/// seeded defaults visible to every account and writable by none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "accountId", rename_all = "camelCase")]
pub enum Ownership {
    Global,
    Account(AccountId),
}

impl Ownership {
    /// The owning account, if any.
    pub fn account_id(&self) -> Option<AccountId> {
        match self {
            Self::Global => None,
            Self::Account(id) => Some(*id),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }

    /// Whether `account_id` may read rows with this ownership.
    pub fn is_visible_to(&self, account_id: AccountId) -> bool {
        match self {
            Self::Global => true,
            Self::Account(owner) => *owner == account_id,
        }
    }

    /// Whether `account_id` may write or delete rows with this ownership.
    pub fn is_writable_by(&self, account_id: AccountId) -> bool {
        matches!(self, Self::Account(owner) if *owner == account_id)
    }
}

/// Maps a nullable owner column: `NULL` means global.
impl From<Option<AccountId>> for Ownership {
    fn from(value: Option<AccountId>) -> Self {
        match value {
            Some(id) => Self::Account(id),
            None => Self::Global,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
