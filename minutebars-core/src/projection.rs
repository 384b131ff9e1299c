//! Session window projection — trim a repaired series to the publish window
//! and render each bar as an output row.

use crate::domain::{MinuteBar, SessionWindow};
use crate::repair::first_adjacency_break;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use thiserror::Error;

/// Column names of the published file, in order.
pub const OUTPUT_HEADER: [&str; 6] = ["time", "open", "high", "low", "close", "volume"];

/// One published minute.
///
/// Prices are pre-rendered with exactly three decimals so every writer emits
/// byte-identical rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    /// Exchange-local `HH:MM`.
    pub time: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: u64,
}

impl OutputRow {
    pub fn from_bar(bar: &MinuteBar, tz: Tz) -> Self {
        Self {
            time: bar.timestamp.with_timezone(&tz).format("%H:%M").to_string(),
            open: format_price(bar.open),
            high: format_price(bar.high),
            low: format_price(bar.low),
            close: format_price(bar.close),
            volume: bar.volume,
        }
    }

    /// Fields in header order.
    pub fn to_record(&self) -> [String; 6] {
        [
            self.time.clone(),
            self.open.clone(),
            self.high.clone(),
            self.low.clone(),
            self.close.clone(),
            self.volume.to_string(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// The input was not contiguous. Unreachable for output of `repair_series`.
    #[error("series is not contiguous: bar at {found} does not follow the previous minute")]
    IncompleteSeries { found: DateTime<Utc> },
}

/// Keep bars inside `publish` (inclusive) and render them.
///
/// The whole input must be minute-contiguous; nothing is repaired here.
pub fn project(
    series: &[MinuteBar],
    publish: &SessionWindow,
    tz: Tz,
) -> Result<Vec<OutputRow>, ProjectionError> {
    if let Some(found) = first_adjacency_break(series) {
        return Err(ProjectionError::IncompleteSeries { found });
    }

    Ok(series
        .iter()
        .skip_while(|bar| bar.timestamp < publish.start)
        .take_while(|bar| bar.timestamp <= publish.end)
        .map(|bar| OutputRow::from_bar(bar, tz))
        .collect())
}

fn format_price(price: f64) -> String {
    format!("{price:.3}")
}
