//! Session windows — inclusive UTC time ranges anchored to one trading date.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An inclusive `[start, end]` range of minute-aligned instants.
///
/// Used as the fetch window (what is requested from the provider) and the
/// publish window (what is written to the output file).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SessionWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Number of whole minutes in the window, counting both endpoints.
    ///
    /// 08:00–16:00 is 481; an inverted window has zero minutes.
    pub fn minute_count(&self) -> usize {
        if self.end < self.start {
            return 0;
        }
        let minutes = (self.end - self.start).num_minutes();
        usize::try_from(minutes).map_or(0, |m| m + 1)
    }

    /// True if `ts` lies within the window (inclusive on both ends).
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// Every minute in the window, ascending.
    pub fn minutes(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        (0..self.minute_count()).map(move |i| self.start + Duration::minutes(i as i64))
    }
}
