//! Explicit deletion targets.
//!
//! Clients send deletions as `{ entityType, entityId }` pairs. They are
//! parsed once, at the request boundary, into a [`DeletionTarget`] that
//! carries the identity shape of its kind. Links are addressed by the pair
//! `(noteId, categoryId)`, encoded on the wire as `"<noteId>:<categoryId>"`.
//! Hyphenated UUIDs never contain `:`, so the encoding is reversible.

use std::fmt;

use crate::entity::EntityKind;
use crate::error::CoreError;
use crate::types::EntityId;

/// Separator between the two halves of a link id.
pub const LINK_ID_SEPARATOR: char = ':';

/// A parsed deletion directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeletionTarget {
    Category(EntityId),
    NoteType(EntityId),
    Note(EntityId),
    NoteCategory {
        note_id: EntityId,
        category_id: EntityId,
    },
    Schedule(EntityId),
    Reminder(EntityId),
}

impl DeletionTarget {
    /// Parse a wire directive. Fails for unknown entity types and for ids
    /// that do not match the identity shape of the kind.
    pub fn parse(entity_type: &str, entity_id: &str) -> Result<Self, CoreError> {
        let kind: EntityKind = entity_type.parse()?;
        Self::from_parts(kind, entity_id)
    }

    pub fn from_parts(kind: EntityKind, entity_id: &str) -> Result<Self, CoreError> {
        Ok(match kind {
            EntityKind::NoteCategory => {
                let (note_id, category_id) = decode_link_id(entity_id)?;
                Self::NoteCategory {
                    note_id,
                    category_id,
                }
            }
            EntityKind::Category => Self::Category(parse_uuid(entity_id)?),
            EntityKind::NoteType => Self::NoteType(parse_uuid(entity_id)?),
            EntityKind::Note => Self::Note(parse_uuid(entity_id)?),
            EntityKind::Schedule => Self::Schedule(parse_uuid(entity_id)?),
            EntityKind::Reminder => Self::Reminder(parse_uuid(entity_id)?),
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Category(_) => EntityKind::Category,
            Self::NoteType(_) => EntityKind::NoteType,
            Self::Note(_) => EntityKind::Note,
            Self::NoteCategory { .. } => EntityKind::NoteCategory,
            Self::Schedule(_) => EntityKind::Schedule,
            Self::Reminder(_) => EntityKind::Reminder,
        }
    }

    /// Wire form of the identity.
    pub fn entity_id(&self) -> String {
        match self {
            Self::Category(id)
            | Self::NoteType(id)
            | Self::Note(id)
            | Self::Schedule(id)
            | Self::Reminder(id) => id.to_string(),
            Self::NoteCategory {
                note_id,
                category_id,
            } => encode_link_id(*note_id, *category_id),
        }
    }
}

impl fmt::Display for DeletionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind(), self.entity_id())
    }
}

/// Encode a link identity as `"<noteId>:<categoryId>"`.
pub fn encode_link_id(note_id: EntityId, category_id: EntityId) -> String {
    format!("{note_id}{LINK_ID_SEPARATOR}{category_id}")
}

/// Inverse of [`encode_link_id`].
pub fn decode_link_id(entity_id: &str) -> Result<(EntityId, EntityId), CoreError> {
    let (note, category) = entity_id.split_once(LINK_ID_SEPARATOR).ok_or_else(|| {
        CoreError::Validation(format!(
            "Link id '{entity_id}' must have the form <noteId>{LINK_ID_SEPARATOR}<categoryId>"
        ))
    })?;
    Ok((parse_uuid(note)?, parse_uuid(category)?))
}

fn parse_uuid(s: &str) -> Result<EntityId, CoreError> {
    EntityId::parse_str(s).map_err(|_| CoreError::Validation(format!("Invalid entity id: '{s}'")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
