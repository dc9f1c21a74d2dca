//! Tombstone retention policy.
//!
//! Tombstones are kept until they are older than the retention horizon,
//! after which they may be purged. A client whose cursor predates the
//! horizon may have missed purged deletions, so it must be sent a full
//! snapshot instead of an incremental feed.

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

/// How long tombstones are retained. `None` keeps them forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetentionPolicy {
    retention_days: Option<i64>,
}

impl RetentionPolicy {
    pub const KEEP_FOREVER: Self = Self {
        retention_days: None,
    };

    /// Longest accepted retention period (100 years).
    pub const MAX_DAYS: i64 = 36_500;

    /// Retain tombstones for `days` days, between 1 and [`Self::MAX_DAYS`].
    pub fn days(days: i64) -> Result<Self, CoreError> {
        if !(1..=Self::MAX_DAYS).contains(&days) {
            return Err(CoreError::Validation(format!(
                "Tombstone retention must be between 1 and {} days, got {days}",
                Self::MAX_DAYS
            )));
        }
        Ok(Self {
            retention_days: Some(days),
        })
    }

    pub fn retention_days(&self) -> Option<i64> {
        self.retention_days
    }

    /// Tombstones deleted before this instant may be purged.
    ///
    /// `None` when retention is disabled or the horizon falls before the
    /// earliest representable instant, in which case nothing is purged.
    pub fn horizon(&self, now: Timestamp) -> Option<Timestamp> {
        let days = Duration::try_days(self.retention_days?)?;
        now.checked_sub_signed(days)
    }

    /// Whether a client syncing from `cursor` needs a full snapshot.
    pub fn requires_full_resync(&self, cursor: Option<Timestamp>, now: Timestamp) -> bool {
        match (cursor, self.horizon(now)) {
            (Some(cursor), Some(horizon)) => cursor < horizon,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap()
    }

    #[test]
    fn keep_forever_has_no_horizon() {
        assert_eq!(RetentionPolicy::KEEP_FOREVER.horizon(now()), None);
        assert!(!RetentionPolicy::KEEP_FOREVER
            .requires_full_resync(Some(now() - Duration::days(10_000)), now()));
    }

    #[test]
    fn horizon_is_now_minus_days() {
        let policy = RetentionPolicy::days(30).unwrap();
        assert_eq!(policy.horizon(now()), Some(now() - Duration::days(30)));
    }

    #[test]
    fn stale_cursor_requires_full_resync() {
        let policy = RetentionPolicy::days(30).unwrap();
        assert!(policy.requires_full_resync(Some(now() - Duration::days(31)), now()));
        assert!(!policy.requires_full_resync(Some(now() - Duration::days(29)), now()));
        assert!(!policy.requires_full_resync(None, now()));
    }

    #[test]
    fn rejects_non_positive_days() {
        assert!(RetentionPolicy::days(0).is_err());
        assert!(RetentionPolicy::days(-5).is_err());
    }

    #[test]
    fn rejects_periods_beyond_max() {
        assert!(RetentionPolicy::days(RetentionPolicy::MAX_DAYS).is_ok());
        assert!(RetentionPolicy::days(RetentionPolicy::MAX_DAYS + 1).is_err());
        assert!(RetentionPolicy::days(200_000_000).is_err());
    }

    #[test]
    fn longest_period_never_overflows() {
        let policy = RetentionPolicy::days(RetentionPolicy::MAX_DAYS).unwrap();
        let now = Utc::now();
        assert!(policy.horizon(now).is_some());
        assert!(!policy.requires_full_resync(Some(now), now));
        assert!(policy.requires_full_resync(Some(DateTime::<Utc>::MIN_UTC), now));
    }

    #[test]
    fn horizon_before_min_instant_is_none() {
        let policy = RetentionPolicy::days(30).unwrap();
        let near_min = DateTime::<Utc>::MIN_UTC + Duration::days(1);
        assert_eq!(policy.horizon(near_min), None);
        assert!(!policy.requires_full_resync(Some(near_min), near_min));
    }
}
