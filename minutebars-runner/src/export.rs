//! Export driver: walks calendar dates and tickers, producing one file per
//! (symbol, trading day).
//!
//! Per unit: session windows → fetch → repair → project → row-count check →
//! atomic write. Either a complete publish-window file is written or nothing is.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use minutebars_core::calendar::{CalendarError, CalendarService, DayKind};
use minutebars_core::data::{BarProvider, ProviderError};
use minutebars_core::domain::SessionWindow;
use minutebars_core::{project, repair_series, ProjectionError, RepairError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::writer::{write_rows, WriteError};

/// What to do when a single (symbol, date) unit fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the run at the first failed unit.
    #[default]
    Abort,
    /// Record the failure and move on to the next unit.
    Continue,
}

/// Output file naming: `{ticker_root}/{SYMBOL}/{SYMBOL}_{YYYYMMDD}_{version}.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    ticker_root: PathBuf,
    version: String,
}

impl OutputLayout {
    pub fn new(ticker_root: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            ticker_root: ticker_root.into(),
            version: version.into(),
        }
    }

    pub fn file_name(&self, symbol: &str, date: NaiveDate) -> String {
        format!("{symbol}_{}_{}.csv", date.format("%Y%m%d"), self.version)
    }

    pub fn path_for(&self, symbol: &str, date: NaiveDate) -> PathBuf {
        self.ticker_root
            .join(symbol)
            .join(self.file_name(symbol, date))
    }
}

/// Failure of one (symbol, date) unit.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Repair(#[from] RepairError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error("session for {date} has not closed yet (last bar closes at {closes_at})")]
    SessionNotClosed {
        date: NaiveDate,
        closes_at: DateTime<Utc>,
    },
    #[error("projected {actual} rows but the publish window has {expected} minutes")]
    RowCount { expected: usize, actual: usize },
    #[error(transparent)]
    Write(#[from] WriteError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("no tickers given")]
    NoTickers,
    #[error("{symbol} on {date}: {source}")]
    Unit {
        symbol: String,
        date: NaiveDate,
        #[source]
        source: UnitError,
    },
}

#[derive(Debug)]
pub struct UnitFailure {
    pub symbol: String,
    pub date: NaiveDate,
    pub error: UnitError,
}

/// Result of one successfully exported unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitOutcome {
    pub path: PathBuf,
    pub rows: usize,
    pub filled: usize,
}

/// Summary of a completed export run.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub trading_days: usize,
    pub skipped_days: Vec<(NaiveDate, DayKind)>,
    /// Trading days whose session had not closed when the run reached them.
    pub unclosed_days: Vec<NaiveDate>,
    pub files: Vec<PathBuf>,
    /// Minutes synthesized across all units.
    pub bars_filled: usize,
    pub failures: Vec<UnitFailure>,
}

impl ExportSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Exporter<'a> {
    calendar: &'a CalendarService,
    provider: &'a dyn BarProvider,
    layout: OutputLayout,
    policy: FailurePolicy,
    clock: fn() -> DateTime<Utc>,
}

impl<'a> Exporter<'a> {
    pub fn new(
        calendar: &'a CalendarService,
        provider: &'a dyn BarProvider,
        layout: OutputLayout,
    ) -> Self {
        Self {
            calendar,
            provider,
            layout,
            policy: FailurePolicy::default(),
            clock: Utc::now,
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the wall clock used to decide whether a session has closed.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Export every ticker for every trading day in `[start, end]`.
    ///
    /// Dates form the outer loop and tickers the inner loop.
    pub fn run(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        tickers: &[String],
    ) -> Result<ExportSummary, ExportError> {
        if start > end {
            return Err(ExportError::InvalidRange { start, end });
        }
        if tickers.is_empty() {
            return Err(ExportError::NoTickers);
        }

        let uncovered = self.calendar.uncovered_years(start, end);
        if !uncovered.is_empty() {
            warn!(years = ?uncovered, "no holidays recorded for these years; every weekday is treated as a trading day");
        }
        info!(%start, %end, ?tickers, provider = self.provider.name(), source = ?self.provider.source(), "starting export");

        let mut summary = ExportSummary::default();

        for date in start.iter_days().take_while(|d| *d <= end) {
            let kind = self.calendar.day_kind(date);
            if kind != DayKind::Trading {
                info!(%date, ?kind, "skipping non-trading day");
                summary.skipped_days.push((date, kind));
                continue;
            }
            if let Ok((fetch, _)) = self.calendar.session_windows(date) {
                if !self.is_closed(&fetch) {
                    warn!(%date, "session has not closed yet, skipping day");
                    summary.unclosed_days.push(date);
                    continue;
                }
            }
            summary.trading_days += 1;

            for symbol in tickers {
                match self.export_unit(symbol, date) {
                    Ok(outcome) => {
                        summary.bars_filled += outcome.filled;
                        summary.files.push(outcome.path);
                    }
                    Err(error) => match self.policy {
                        FailurePolicy::Abort => {
                            return Err(ExportError::Unit {
                                symbol: symbol.clone(),
                                date,
                                source: error,
                            })
                        }
                        FailurePolicy::Continue => {
                            warn!(symbol = %symbol, %date, %error, "unit failed, continuing");
                            summary.failures.push(UnitFailure {
                                symbol: symbol.clone(),
                                date,
                                error,
                            });
                        }
                    },
                }
            }
        }

        info!(
            files = summary.files.len(),
            skipped_days = summary.skipped_days.len(),
            unclosed_days = summary.unclosed_days.len(),
            failures = summary.failures.len(),
            "export complete"
        );
        Ok(summary)
    }

    /// Produce the file for one symbol on one trading day.
    pub fn export_unit(&self, symbol: &str, date: NaiveDate) -> Result<UnitOutcome, UnitError> {
        let (fetch, publish) = self.calendar.session_windows(date)?;
        if !self.is_closed(&fetch) {
            return Err(UnitError::SessionNotClosed {
                date,
                closes_at: closes_at(&fetch),
            });
        }
        let path = self.layout.path_for(symbol, date);
        info!(path = %path.display(), "Generating file");

        let raw = self.provider.fetch_minute_bars(symbol, &fetch)?;
        let insane = raw.iter().filter(|b| !b.is_sane()).count();
        if insane > 0 {
            warn!(symbol, %date, insane, "provider returned bars with inconsistent OHLC");
        }
        let repaired = repair_series(&raw, &fetch)?;
        if repaired.filled > 0 {
            debug!(symbol, %date, filled = repaired.filled, "flat-filled missing minutes");
        }

        let rows = project(&repaired.bars, &publish, self.calendar.timezone())?;
        let expected = publish.minute_count();
        if rows.len() != expected {
            return Err(UnitError::RowCount {
                expected,
                actual: rows.len(),
            });
        }

        write_rows(&path, &rows)?;
        Ok(UnitOutcome {
            path,
            rows: rows.len(),
            filled: repaired.filled,
        })
    }

    /// A session is closed once its last minute bar has completed.
    fn is_closed(&self, fetch: &SessionWindow) -> bool {
        (self.clock)() >= closes_at(fetch)
    }
}

fn closes_at(fetch: &SessionWindow) -> DateTime<Utc> {
    fetch.end + Duration::minutes(1)
}

