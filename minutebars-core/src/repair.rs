//! Minute-series repair — gap detection and flat-fill synthesis.
//!
//! Given the raw bars for one symbol over one fetch window, produce a new
//! series with exactly one bar per minute from the window start to the window
//! end inclusive. A missing minute is synthesized as a flat bar at the
//! previous minute's close with zero volume: "no trading happened", never an
//! interpolated price.
//!
//! The raw input is borrowed and never modified. Raw bars are passed through
//! unchanged and in order; the only bars this module creates are fills.

use crate::domain::{MinuteBar, SessionWindow};
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Repair failures.
///
/// Everything except `IncompleteSeries` is a precondition violation by the
/// provider and fails the (symbol, date) unit. `IncompleteSeries` means the
/// repair itself is broken.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepairError {
    #[error("series does not start at the fetch window start {expected} (first bar: {})",
        describe_first(.found))]
    MisalignedSeriesStart {
        expected: DateTime<Utc>,
        found: Option<DateTime<Utc>>,
    },

    #[error("bar at {timestamp} is not on a whole minute")]
    UnalignedTimestamp { timestamp: DateTime<Utc> },

    #[error("bar at {found} does not come after the previous bar at {previous} (duplicate or out of order)")]
    UnorderedInput {
        previous: DateTime<Utc>,
        found: DateTime<Utc>,
    },

    #[error("bar at {timestamp} lies after the fetch window end {window_end}")]
    BarOutsideWindow {
        timestamp: DateTime<Utc>,
        window_end: DateTime<Utc>,
    },

    #[error("repaired series is incomplete: expected {expected_bars} bars, got {actual_bars}{}",
        describe_break(.first_break))]
    IncompleteSeries {
        expected_bars: usize,
        actual_bars: usize,
        first_break: Option<DateTime<Utc>>,
    },
}

fn describe_first(found: &Option<DateTime<Utc>>) -> String {
    found.map_or_else(|| "none".to_string(), |t| t.to_rfc3339())
}

fn describe_break(first_break: &Option<DateTime<Utc>>) -> String {
    first_break.map_or_else(String::new, |t| format!(", first break at {}", t.to_rfc3339()))
}

/// A contiguous series plus the number of minutes that had to be synthesized.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairedSeries {
    pub bars: Vec<MinuteBar>,
    pub filled: usize,
}

/// Repair `raw` so it covers every minute of `window`.
///
/// Preconditions checked here rather than assumed:
/// - the first bar sits exactly on `window.start`
/// - every timestamp is minute-aligned, strictly increasing, and not after `window.end`
///
/// A gap after the last raw bar is filled through `window.end`.
pub fn repair_series(
    raw: &[MinuteBar],
    window: &SessionWindow,
) -> Result<RepairedSeries, RepairError> {
    let first = raw.first().ok_or(RepairError::MisalignedSeriesStart {
        expected: window.start,
        found: None,
    })?;
    if first.timestamp != window.start {
        return Err(RepairError::MisalignedSeriesStart {
            expected: window.start,
            found: Some(first.timestamp),
        });
    }

    let mut bars = Vec::with_capacity(window.minute_count().max(raw.len()));
    let mut filled = 0;

    for bar in raw {
        if !bar.is_minute_aligned() {
            return Err(RepairError::UnalignedTimestamp {
                timestamp: bar.timestamp,
            });
        }
        if bar.timestamp > window.end {
            return Err(RepairError::BarOutsideWindow {
                timestamp: bar.timestamp,
                window_end: window.end,
            });
        }
        if let Some(previous) = bars.last().map(|b: &MinuteBar| b.timestamp) {
            if bar.timestamp <= previous {
                return Err(RepairError::UnorderedInput {
                    previous,
                    found: bar.timestamp,
                });
            }
            filled += fill_before(&mut bars, bar.timestamp);
        }
        bars.push(bar.clone());
    }

    filled += fill_before(&mut bars, window.end + Duration::minutes(1));

    verify_contiguous(&bars, window)?;
    Ok(RepairedSeries { bars, filled })
}

/// Append flat bars for every minute between the last bar and `until` (exclusive).
fn fill_before(bars: &mut Vec<MinuteBar>, until: DateTime<Utc>) -> usize {
    let Some(last) = bars.last() else {
        return 0;
    };
    let price = last.close;
    let tracks_extras = last.tracks_extras();
    let mut ts = last.next_minute();

    let mut count = 0;
    while ts < until {
        bars.push(MinuteBar::flat(ts, price, tracks_extras));
        ts += Duration::minutes(1);
        count += 1;
    }
    count
}

fn verify_contiguous(bars: &[MinuteBar], window: &SessionWindow) -> Result<(), RepairError> {
    let first_break = first_adjacency_break(bars);
    let starts_right = bars.first().map(|b| b.timestamp) == Some(window.start);
    if first_break.is_some() || !starts_right || bars.len() != window.minute_count() {
        return Err(RepairError::IncompleteSeries {
            expected_bars: window.minute_count(),
            actual_bars: bars.len(),
            first_break,
        });
    }
    Ok(())
}

/// Timestamp of the first bar that is not exactly one minute after its predecessor.
pub fn first_adjacency_break(bars: &[MinuteBar]) -> Option<DateTime<Utc>> {
    bars.windows(2)
        .find(|pair| pair[1].timestamp != pair[0].next_minute())
        .map(|pair| pair[1].timestamp)
}
