//! MinuteBar — the fundamental market data unit.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol covering one minute of trading.
///
/// `trade_count` and `vwap` are carried through when the provider supplies
/// them but are never written to the published output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinuteBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    #[serde(default)]
    pub trade_count: Option<u64>,
    #[serde(default)]
    pub vwap: Option<f64>,
}

impl MinuteBar {
    /// A bar with no trading activity: every price equals `price`, volume is zero.
    ///
    /// `tracks_extras` controls whether trade count and VWAP are recorded as
    /// zero or left absent, so synthesized bars match the shape of their neighbours.
    pub fn flat(timestamp: DateTime<Utc>, price: f64, tracks_extras: bool) -> Self {
        Self {
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0,
            trade_count: tracks_extras.then_some(0),
            vwap: tracks_extras.then_some(0.0),
        }
    }

    /// True if this bar carries trade count or VWAP.
    pub fn tracks_extras(&self) -> bool {
        self.trade_count.is_some() || self.vwap.is_some()
    }

    /// True if the timestamp sits exactly on a minute boundary.
    pub fn is_minute_aligned(&self) -> bool {
        is_minute_aligned(self.timestamp)
    }

    /// Timestamp of the minute immediately after this bar.
    pub fn next_minute(&self) -> DateTime<Utc> {
        self.timestamp + Duration::minutes(1)
    }

    /// Basic OHLC sanity check: high >= low, high >= open/close, low <= open/close.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// True if `ts` has zero seconds and zero sub-second component.
pub fn is_minute_aligned(ts: DateTime<Utc>) -> bool {
    ts.second() == 0 && ts.nanosecond() == 0
}
