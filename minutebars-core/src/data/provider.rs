//! Market-data provider trait and structured error types.
//!
//! The BarProvider trait abstracts over minute-bar sources (Alpaca, CSV
//! replay) so the export driver can swap implementations and mock for tests.

use crate::domain::{MinuteBar, SessionWindow};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for provider operations.
///
/// All of these are fatal for the (symbol, date) unit being fetched; the
/// core never retries.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network unreachable: {0}")]
    Transport(String),

    #[error("provider returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("response could not be decoded: {0}")]
    Decode(String),

    #[error("provider configuration error: {0}")]
    Config(String),
}

/// Where bars came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Alpaca,
    CsvReplay,
}

/// Source of raw minute bars.
///
/// Implementations return bars in the order the upstream source supplies
/// them. Ordering and duplicates are checked by the repair engine, not here.
pub trait BarProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Fetch one-minute bars for `symbol` with timestamps inside `window` (inclusive).
    fn fetch_minute_bars(
        &self,
        symbol: &str,
        window: &SessionWindow,
    ) -> Result<Vec<MinuteBar>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    struct MockProvider {
        bars: Vec<MinuteBar>,
    }

    impl BarProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn source(&self) -> DataSource {
            DataSource::CsvReplay
        }

        fn fetch_minute_bars(
            &self,
            _symbol: &str,
            window: &SessionWindow,
        ) -> Result<Vec<MinuteBar>, ProviderError> {
            Ok(self
                .bars
                .iter()
                .filter(|b| window.contains(b.timestamp))
                .cloned()
                .collect())
        }
    }

    #[test]
    fn provider_is_object_safe_via_box() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 13, 0, 0).unwrap();
        let provider: Box<dyn BarProvider> = Box::new(MockProvider {
            bars: vec![MinuteBar::flat(ts, 10.0, false)],
        });
        let bars = provider
            .fetch_minute_bars("SPY", &SessionWindow::new(ts, ts))
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn provider_error_display() {
        let err = ProviderError::Api {
            status: 422,
            message: "invalid symbol".into(),
        };
        assert_eq!(err.to_string(), "provider returned HTTP 422: invalid symbol");
        let err = ProviderError::SymbolNotFound {
            symbol: "ZZZZ".into(),
        };
        assert_eq!(err.to_string(), "symbol not found: ZZZZ");
    }
}
