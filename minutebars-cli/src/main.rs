//! Minutebars CLI — export one CSV per ticker per trading day.
//!
//! ```text
//! minutebars -s 20240301 -e 20240331 -t SPY,QQQ
//! ```
//!
//! Alpaca credentials are read from `APCA_API_KEY_ID` / `APCA_API_SECRET_KEY`
//! unless `--replay-dir` selects the offline CSV provider.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use minutebars_runner::{ExportConfig, Exporter, FailurePolicy, ProviderKind};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "minutebars",
    about = "Export gap-filled one-minute bars for each trading day"
)]
struct Cli {
    /// First date to export (YYYYMMDD).
    #[arg(short = 's', long = "start", value_parser = parse_date)]
    start: NaiveDate,

    /// Comma-separated tickers (e.g. SPY,QQQ,AAPL).
    #[arg(short = 't', long = "tickers", value_delimiter = ',', required = true)]
    tickers: Vec<String>,

    /// Last date to export (YYYYMMDD). Defaults to today in the exchange timezone.
    #[arg(short = 'e', long = "end", value_parser = parse_date)]
    end: Option<NaiveDate>,

    /// TOML run configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Holiday JSON, overriding the configuration.
    #[arg(long)]
    holidays: Option<PathBuf>,

    /// Output root, overriding the configuration.
    #[arg(long)]
    ticker_root: Option<PathBuf>,

    /// Replay bars from `<DIR>/<SYMBOL>.csv` instead of calling Alpaca.
    #[arg(long)]
    replay_dir: Option<PathBuf>,

    /// Keep exporting after a failed (ticker, date) unit.
    #[arg(long, default_value_t = false)]
    continue_on_error: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|e| format!("expected YYYYMMDD: {e}"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{e:#}");
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the run completed but some units failed.
fn run(cli: Cli) -> Result<bool> {
    let config = load_config(&cli)?;

    let tickers = normalize_tickers(&cli.tickers);
    if tickers.is_empty() {
        bail!("no tickers given");
    }

    // Credentials and provider setup fail here, before any date is visited.
    let provider = config.provider.build().context("configuring bar provider")?;
    let calendar = config.calendar()?;

    let end = cli
        .end
        .unwrap_or_else(|| chrono::Utc::now().with_timezone(&calendar.timezone()).date_naive());
    info!(start = %cli.start, %end, ?tickers, "parsed arguments");

    let exporter = Exporter::new(&calendar, provider.as_ref(), config.layout())
        .with_failure_policy(config.failure_policy);
    let summary = exporter.run(cli.start, end, &tickers)?;

    for failure in &summary.failures {
        error!(symbol = %failure.symbol, date = %failure.date, "{}", failure.error);
    }
    Ok(summary.all_succeeded())
}

fn load_config(cli: &Cli) -> Result<ExportConfig> {
    let mut config = match &cli.config {
        Some(path) => ExportConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ExportConfig::default(),
    };

    if let Some(path) = &cli.holidays {
        config.holidays_path = path.clone();
    }
    if let Some(path) = &cli.ticker_root {
        config.ticker_root = path.clone();
    }
    if let Some(dir) = &cli.replay_dir {
        config.provider.kind = ProviderKind::CsvReplay;
        config.provider.replay_dir = Some(dir.clone());
    }
    if cli.continue_on_error {
        config.failure_policy = FailurePolicy::Continue;
    }
    config.validate()?;
    Ok(config)
}

fn normalize_tickers(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|t| t.trim().to_ascii_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let cli = Cli::try_parse_from(["minutebars", "-s", "20240301", "-t", "spy, qqq", "-e", "20240331"])
            .unwrap();
        assert_eq!(cli.start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(cli.end, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(normalize_tickers(&cli.tickers), vec!["SPY", "QQQ"]);
    }

    #[test]
    fn start_and_tickers_are_required() {
        assert!(Cli::try_parse_from(["minutebars", "-t", "SPY"]).is_err());
        assert!(Cli::try_parse_from(["minutebars", "-s", "20240301"]).is_err());
    }

    #[test]
    fn malformed_date_is_rejected() {
        assert!(Cli::try_parse_from(["minutebars", "-s", "2024-03-01", "-t", "SPY"]).is_err());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "minutebars",
            "-s",
            "20240301",
            "-t",
            "SPY",
            "--replay-dir",
            "/tmp/replay",
            "--ticker-root",
            "/tmp/out",
            "--continue-on-error",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::CsvReplay);
        assert_eq!(config.ticker_root, PathBuf::from("/tmp/out"));
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
    }
}
