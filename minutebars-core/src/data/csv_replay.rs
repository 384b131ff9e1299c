//! Offline provider that replays minute bars from CSV files.
//!
//! Layout: `{dir}/{SYMBOL}.csv` with header
//! `timestamp,open,high,low,close,volume[,trade_count,vwap]`.
//! Timestamps are RFC 3339. Rows may span several days; only rows inside the
//! requested window are returned, in file order.

use super::provider::{BarProvider, DataSource, ProviderError};
use crate::domain::{MinuteBar, SessionWindow};
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct CsvReplayProvider {
    dir: PathBuf,
}

impl CsvReplayProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn symbol_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl BarProvider for CsvReplayProvider {
    fn name(&self) -> &str {
        "csv-replay"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvReplay
    }

    fn fetch_minute_bars(
        &self,
        symbol: &str,
        window: &SessionWindow,
    ) -> Result<Vec<MinuteBar>, ProviderError> {
        let path = self.symbol_path(symbol);
        let mut reader = match csv::Reader::from_path(&path) {
            Ok(reader) => reader,
            Err(e) => {
                return Err(match e.kind() {
                    csv::ErrorKind::Io(io) if io.kind() == ErrorKind::NotFound => {
                        ProviderError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        }
                    }
                    _ => ProviderError::Transport(format!("{}: {e}", path.display())),
                })
            }
        };

        let mut bars = Vec::new();
        for (line, record) in reader.deserialize::<MinuteBar>().enumerate() {
            // header is line 1
            let bar = record.map_err(|e| {
                ProviderError::Decode(format!("{} row {}: {e}", path.display(), line + 2))
            })?;
            if window.contains(bar.timestamp) {
                bars.push(bar);
            }
        }

        tracing::debug!(symbol, bars = bars.len(), path = %path.display(), "replayed minute bars");
        Ok(bars)
    }
}
