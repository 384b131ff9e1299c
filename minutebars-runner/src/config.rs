//! Serializable export configuration.
//!
//! Every field has a default matching the historical layout, so an empty TOML
//! file (or no file at all) is a valid configuration:
//!
//! ```toml
//! ticker_root = "../tickers"
//! holidays_path = "../../properties/market-holidays.json"
//! output_version = "v000"
//! failure_policy = "abort"
//!
//! [session]
//! timezone = "America/New_York"
//! fetch_start = "08:00"
//! publish_start = "08:30"
//! end = "16:00"
//!
//! [provider]
//! kind = "alpaca"
//! feed = "iex"
//! ```

use anyhow::Context;
use minutebars_core::calendar::{CalendarError, CalendarService, HolidayTable, SessionSchedule};
use minutebars_core::data::{
    AlpacaCredentials, AlpacaProvider, BarProvider, CsvReplayProvider, ProviderError,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::export::{FailurePolicy, OutputLayout};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config TOML: {0}")]
    Parse(String),
    #[error("output version '{0}' must be 'v' followed by three digits")]
    InvalidVersion(String),
    #[error("provider kind 'csv_replay' requires replay_dir")]
    MissingReplayDir,
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Complete run configuration for the `minutebars` exporter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Root directory holding one sub-directory per symbol.
    pub ticker_root: PathBuf,

    /// Holiday JSON keyed by year.
    pub holidays_path: PathBuf,

    /// Version token embedded in every output file name.
    pub output_version: String,

    pub failure_policy: FailurePolicy,

    pub session: SessionConfig,

    pub provider: ProviderConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            ticker_root: PathBuf::from("../tickers"),
            holidays_path: PathBuf::from("../../properties/market-holidays.json"),
            output_version: "v000".to_string(),
            failure_policy: FailurePolicy::default(),
            session: SessionConfig::default(),
            provider: ProviderConfig::default(),
        }
    }
}

/// Session boundaries as exchange-local `HH:MM` strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub timezone: String,
    pub fetch_start: String,
    pub publish_start: String,
    pub end: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".to_string(),
            fetch_start: "08:00".to_string(),
            publish_start: "08:30".to_string(),
            end: "16:00".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn schedule(&self) -> Result<SessionSchedule, CalendarError> {
        SessionSchedule::parse(&self.timezone, &self.fetch_start, &self.publish_start, &self.end)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Alpaca,
    CsvReplay,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Overrides the Alpaca data endpoint.
    pub base_url: Option<String>,
    /// Alpaca data feed, e.g. `iex` or `sip`.
    pub feed: Option<String>,
    /// Directory of `<SYMBOL>.csv` files for the replay provider.
    pub replay_dir: Option<PathBuf>,
}

impl ProviderConfig {
    /// Construct the configured provider. Alpaca credentials are read from the environment here.
    pub fn build(&self) -> Result<Box<dyn BarProvider>, ConfigError> {
        match self.kind {
            ProviderKind::Alpaca => {
                let credentials = AlpacaCredentials::from_env()?;
                let mut provider = AlpacaProvider::new(credentials)?.with_feed(self.feed.clone());
                if let Some(url) = &self.base_url {
                    provider = provider.with_base_url(url.clone());
                }
                Ok(Box::new(provider))
            }
            ProviderKind::CsvReplay => {
                let dir = self.replay_dir.as_ref().ok_or(ConfigError::MissingReplayDir)?;
                Ok(Box::new(CsvReplayProvider::new(dir.clone())))
            }
        }
    }
}

impl ExportConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_version_token(&self.output_version) {
            return Err(ConfigError::InvalidVersion(self.output_version.clone()));
        }
        if self.provider.kind == ProviderKind::CsvReplay && self.provider.replay_dir.is_none() {
            return Err(ConfigError::MissingReplayDir);
        }
        self.session.schedule()?;
        Ok(())
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(self.ticker_root.clone(), self.output_version.clone())
    }

    /// Load the holiday table and session schedule into a calendar.
    pub fn calendar(&self) -> anyhow::Result<CalendarService> {
        let holidays = HolidayTable::from_file(&self.holidays_path).with_context(|| {
            format!("loading holidays from {}", self.holidays_path.display())
        })?;
        if holidays.is_empty() {
            tracing::warn!(path = %self.holidays_path.display(), "holiday table is empty");
        }
        let schedule = self.session.schedule().context("building session schedule")?;
        Ok(CalendarService::new(holidays, schedule))
    }
}

fn is_version_token(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 4 && bytes[0] == b'v' && bytes[1..].iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = ExportConfig::from_toml("").unwrap();
        assert_eq!(config, ExportConfig::default());
        assert_eq!(config.output_version, "v000");
        assert_eq!(config.ticker_root, PathBuf::from("../tickers"));
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.provider.kind, ProviderKind::Alpaca);
    }

    #[test]
    fn parses_full_config() {
        let config = ExportConfig::from_toml(
            r#"
            ticker_root = "/data/tickers"
            output_version = "v003"
            failure_policy = "continue"

            [session]
            fetch_start = "09:00"
            publish_start = "09:30"

            [provider]
            kind = "csv_replay"
            replay_dir = "/data/replay"
            "#,
        )
        .unwrap();
        assert_eq!(config.ticker_root, PathBuf::from("/data/tickers"));
        assert_eq!(config.output_version, "v003");
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
        assert_eq!(config.session.end, "16:00");
        assert_eq!(config.provider.kind, ProviderKind::CsvReplay);
        assert!(config.provider.build().is_ok());
    }

    #[test]
    fn rejects_bad_version_token() {
        for bad in ["v00", "000", "V000", "v0001", "vabc"] {
            let toml = format!("output_version = \"{bad}\"");
            assert!(
                matches!(ExportConfig::from_toml(&toml), Err(ConfigError::InvalidVersion(_))),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn rejects_replay_without_dir() {
        let err = ExportConfig::from_toml("[provider]\nkind = \"csv_replay\"").unwrap_err();
        assert!(matches!(err, ConfigError::MissingReplayDir));
    }

    #[test]
    fn rejects_inverted_session() {
        let err = ExportConfig::from_toml("[session]\npublish_start = \"07:00\"").unwrap_err();
        assert!(matches!(err, ConfigError::Calendar(CalendarError::InvalidSchedule(_))));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let err = ExportConfig::from_toml("[session]\ntimezone = \"Mars/Olympus\"").unwrap_err();
        assert!(matches!(err, ConfigError::Calendar(CalendarError::UnknownTimezone(_))));
    }

    #[test]
    fn missing_holiday_file_fails_calendar_load() {
        let config = ExportConfig {
            holidays_path: PathBuf::from("/nonexistent/holidays.json"),
            ..ExportConfig::default()
        };
        let err = config.calendar().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/holidays.json"));
    }
}
