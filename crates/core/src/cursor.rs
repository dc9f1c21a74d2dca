//! Sync cursor advancement.
//!
//! Two strategies are offered because they trade different risks:
//!
//! - [`CursorStrategy::InvocationTime`] moves the cursor to the moment the
//!   sync started, even when nothing changed. The next feed is small, but a
//!   concurrent write that commits later with an earlier timestamp is never
//!   reported to this device.
//! - [`CursorStrategy::MaxSeen`] moves the cursor only as far as the newest
//!   timestamp actually returned. A late commit stamped between that point
//!   and the invocation time is still picked up on the next sync. A late
//!   commit stamped before the newest returned row is still missed, so the
//!   window is narrowed, not closed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// How the cursor handed back to the client is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorStrategy {
    #[default]
    InvocationTime,
    MaxSeen,
}

impl CursorStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvocationTime => "invocation_time",
            Self::MaxSeen => "max_seen",
        }
    }

    /// Compute the next cursor.
    ///
    /// `MaxSeen` never moves backwards past `previous`, and falls back to the
    /// invocation time only when there is neither a previous cursor nor any
    /// observed row.
    pub fn advance(
        self,
        invoked_at: Timestamp,
        previous: Option<Timestamp>,
        high_water: HighWaterMark,
    ) -> Timestamp {
        match self {
            Self::InvocationTime => invoked_at,
            Self::MaxSeen => match (previous, high_water.get()) {
                (Some(prev), Some(seen)) => prev.max(seen),
                (None, Some(seen)) => seen,
                (Some(prev), None) => prev,
                (None, None) => invoked_at,
            },
        }
    }
}

impl fmt::Display for CursorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CursorStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invocation_time" => Ok(Self::InvocationTime),
            "max_seen" => Ok(Self::MaxSeen),
            other => Err(CoreError::Validation(format!(
                "Unknown cursor strategy '{other}'. Expected 'invocation_time' or 'max_seen'"
            ))),
        }
    }
}

/// Latest timestamp observed among the rows of a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighWaterMark(Option<Timestamp>);

impl HighWaterMark {
    pub fn observe(&mut self, at: Timestamp) {
        self.0 = Some(match self.0 {
            Some(current) => current.max(at),
            None => at,
        });
    }

    pub fn observe_opt(&mut self, at: Option<Timestamp>) {
        if let Some(at) = at {
            self.observe(at);
        }
    }

    pub fn get(&self) -> Option<Timestamp> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
