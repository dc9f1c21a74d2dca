//! Last-write-wins conflict resolution.
//!
//! A record's version is the later of its modification timestamp and its
//! tombstone. The same definition is used for stored and incoming records,
//! so a tombstone can only be cleared by a write that is strictly newer than
//! the deletion itself.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::types::Timestamp;

/// A record that takes part in last-write-wins comparison.
pub trait Versioned {
    /// Identity of the record (a UUID, or a composite pair for links).
    type Key: Eq + Hash + Clone + Debug;

    /// When `true`, an incoming tombstone overwrites a live stored record
    /// regardless of timestamps.
    const TOMBSTONE_ALWAYS_WINS: bool = false;

    fn key(&self) -> Self::Key;

    /// `updated_at`, or `created_at` for kinds without one.
    fn modified_at(&self) -> Timestamp;

    fn deleted_at(&self) -> Option<Timestamp>;

    /// Move the modification timestamp forward to `to`.
    fn raise_version(&mut self, to: Timestamp);

    fn version(&self) -> Timestamp {
        match self.deleted_at() {
            Some(deleted_at) => self.modified_at().max(deleted_at),
            None => self.modified_at(),
        }
    }

    fn is_tombstone(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// What to do with an incoming record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No stored record with this identity.
    Insert,
    /// The incoming record replaces the stored one.
    Overwrite,
    /// The stored record stays as it is.
    Keep,
}

/// Decide between a stored record and an incoming one.
///
/// Overwrites only when the incoming version is strictly newer; a tie keeps
/// the stored record because the incoming write brings nothing new.
pub fn resolve<T: Versioned>(stored: Option<&T>, incoming: &T) -> Resolution {
    let Some(stored) = stored else {
        return Resolution::Insert;
    };

    if T::TOMBSTONE_ALWAYS_WINS && incoming.is_tombstone() && !stored.is_tombstone() {
        return Resolution::Overwrite;
    }

    if incoming.version() > stored.version() {
        Resolution::Overwrite
    } else {
        Resolution::Keep
    }
}

/// Collapse duplicate identities inside one client batch.
///
/// The first occurrence of each key keeps its position. Among duplicates a
/// tombstone always survives: deletions are not revived by a sibling in the
/// same batch, and the surviving tombstone takes the highest version seen so
/// it wins anywhere that sibling would have won. Otherwise the newest
/// version survives, and the earlier record wins ties.
pub fn coalesce_batch<T: Versioned>(records: Vec<T>) -> Vec<T> {
    let mut slots: HashMap<T::Key, usize> = HashMap::with_capacity(records.len());
    let mut out: Vec<T> = Vec::with_capacity(records.len());

    for record in records {
        match slots.get(&record.key()) {
            Some(&slot) => {
                let current = &mut out[slot];
                let max_version = current.version().max(record.version());

                let replace = match (current.is_tombstone(), record.is_tombstone()) {
                    (true, false) => false,
                    (false, true) => true,
                    _ => record.version() > current.version(),
                };
                if replace {
                    *current = record;
                }
                if current.is_tombstone() && current.version() < max_version {
                    current.raise_version(max_version);
                }
            }
            None => {
                slots.insert(record.key(), out.len());
                out.push(record);
            }
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        label: &'static str,
        updated_at: Timestamp,
        deleted_at: Option<Timestamp>,
    }

    impl Versioned for Row {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }
        fn modified_at(&self) -> Timestamp {
            self.updated_at
        }
        fn deleted_at(&self) -> Option<Timestamp> {
            self.deleted_at
        }
        fn raise_version(&mut self, to: Timestamp) {
            self.updated_at = to;
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Link {
        created_at: Timestamp,
        deleted_at: Option<Timestamp>,
    }

    impl Versioned for Link {
        type Key = (u32, u32);
        const TOMBSTONE_ALWAYS_WINS: bool = true;

        fn key(&self) -> (u32, u32) {
            (1, 2)
        }
        fn modified_at(&self) -> Timestamp {
            self.created_at
        }
        fn deleted_at(&self) -> Option<Timestamp> {
            self.deleted_at
        }
        fn raise_version(&mut self, to: Timestamp) {
            self.created_at = to;
        }
    }

    fn t(mins: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(mins)
    }

    fn live(id: u32, label: &'static str, at: i64) -> Row {
        Row {
            id,
            label,
            updated_at: t(at),
            deleted_at: None,
        }
    }

    fn dead(id: u32, at: i64, deleted: i64) -> Row {
        Row {
            id,
            label: "dead",
            updated_at: t(at),
            deleted_at: Some(t(deleted)),
        }
    }

    // -- resolve -------------------------------------------------------------

    #[test]
    fn inserts_when_nothing_stored() {
        assert_eq!(resolve(None, &live(1, "a", 0)), Resolution::Insert);
    }

    #[test]
    fn newer_incoming_overwrites() {
        assert_eq!(
            resolve(Some(&live(1, "a", 0)), &live(1, "b", 1)),
            Resolution::Overwrite
        );
    }

    #[test]
    fn tie_keeps_stored() {
        assert_eq!(
            resolve(Some(&live(1, "a", 5)), &live(1, "b", 5)),
            Resolution::Keep
        );
    }

    #[test]
    fn older_incoming_is_kept_out() {
        assert_eq!(
            resolve(Some(&live(1, "a", 5)), &live(1, "b", 4)),
            Resolution::Keep
        );
    }

    #[test]
    fn tombstone_time_counts_as_version() {
        // Deleted at 10 without touching updated_at: a write at 7 must not revive it.
        let stored = dead(1, 2, 10);
        assert_eq!(resolve(Some(&stored), &live(1, "b", 7)), Resolution::Keep);
        assert_eq!(
            resolve(Some(&stored), &live(1, "b", 11)),
            Resolution::Overwrite
        );
    }

    #[test]
    fn link_tombstone_beats_newer_live_link() {
        let stored = Link {
            created_at: t(10),
            deleted_at: None,
        };
        let incoming = Link {
            created_at: t(1),
            deleted_at: Some(t(2)),
        };
        assert_eq!(resolve(Some(&stored), &incoming), Resolution::Overwrite);
    }

    #[test]
    fn link_revival_needs_newer_creation() {
        let stored = Link {
            created_at: t(1),
            deleted_at: Some(t(5)),
        };
        let stale = Link {
            created_at: t(4),
            deleted_at: None,
        };
        let fresh = Link {
            created_at: t(6),
            deleted_at: None,
        };
        assert_eq!(resolve(Some(&stored), &stale), Resolution::Keep);
        assert_eq!(resolve(Some(&stored), &fresh), Resolution::Overwrite);
    }

    // -- coalesce_batch ------------------------------------------------------

    #[test]
    fn distinct_keys_pass_through_in_order() {
        let out = coalesce_batch(vec![live(2, "b", 0), live(1, "a", 0)]);
        assert_eq!(out.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn newest_duplicate_wins() {
        let out = coalesce_batch(vec![live(1, "old", 1), live(1, "new", 2), live(1, "mid", 1)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, "new");
    }

    #[test]
    fn tombstone_survives_newer_live_sibling() {
        let out = coalesce_batch(vec![live(1, "live", 9), dead(1, 3, 3)]);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_tombstone());
        assert_eq!(out[0].version(), t(9));
    }

    #[test]
    fn tombstone_survives_when_listed_first() {
        let out = coalesce_batch(vec![dead(1, 3, 3), live(1, "live", 9)]);
        assert!(out[0].is_tombstone());
        assert_eq!(out[0].version(), t(9));
    }

    #[test]
    fn later_tombstone_replaces_earlier_one() {
        let out = coalesce_batch(vec![dead(1, 1, 1), dead(1, 4, 4)]);
        assert_eq!(out[0].deleted_at, Some(t(4)));
    }
}
