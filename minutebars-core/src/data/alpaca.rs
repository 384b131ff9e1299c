//! Alpaca market-data provider.
//!
//! Fetches one-minute stock bars from the Alpaca v2 bars endpoint, following
//! `next_page_token` until the window is exhausted. Requests are blocking and
//! are not retried; a failed request fails the unit.

use super::provider::{BarProvider, DataSource, ProviderError};
use crate::domain::{MinuteBar, SessionWindow};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// API key pair sent as request headers.
#[derive(Clone)]
pub struct AlpacaCredentials {
    key_id: String,
    secret_key: String,
}

impl AlpacaCredentials {
    pub const KEY_ID_VAR: &'static str = "APCA_API_KEY_ID";
    pub const SECRET_KEY_VAR: &'static str = "APCA_API_SECRET_KEY";

    pub fn new(key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Read both variables from the environment. An unset or empty variable is an error.
    pub fn from_env() -> Result<Self, ProviderError> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    ProviderError::Config(format!("environment variable {name} is not set"))
                })
        };
        Ok(Self::new(read(Self::KEY_ID_VAR)?, read(Self::SECRET_KEY_VAR)?))
    }
}

impl fmt::Debug for AlpacaCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlpacaCredentials")
            .field("key_id", &self.key_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// One page of the bars endpoint.
#[derive(Debug, Deserialize)]
struct BarsPage {
    #[serde(default)]
    bars: Option<Vec<AlpacaBar>>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlpacaBar {
    t: DateTime<Utc>,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: u64,
    #[serde(default)]
    n: Option<u64>,
    #[serde(default)]
    vw: Option<f64>,
}

impl From<AlpacaBar> for MinuteBar {
    fn from(bar: AlpacaBar) -> Self {
        MinuteBar {
            timestamp: bar.t,
            open: bar.o,
            high: bar.h,
            low: bar.l,
            close: bar.c,
            volume: bar.v,
            trade_count: bar.n,
            vwap: bar.vw,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Alpaca minute-bar provider.
pub struct AlpacaProvider {
    client: reqwest::blocking::Client,
    credentials: AlpacaCredentials,
    base_url: String,
    feed: Option<String>,
    page_limit: u32,
}

impl AlpacaProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://data.alpaca.markets";

    pub fn new(credentials: AlpacaCredentials) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            credentials,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            feed: None,
            page_limit: 10_000,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Data feed (`iex`, `sip`, ...). `None` lets the server pick the account default.
    pub fn with_feed(mut self, feed: Option<String>) -> Self {
        self.feed = feed;
        self
    }

    fn bars_url(&self, symbol: &str) -> String {
        format!(
            "{}/v2/stocks/{symbol}/bars",
            self.base_url.trim_end_matches('/')
        )
    }

    fn query(&self, window: &SessionWindow, page_token: Option<&str>) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("timeframe", "1Min".to_string()),
            ("start", window.start.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("end", window.end.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("limit", self.page_limit.to_string()),
        ];
        if let Some(feed) = &self.feed {
            query.push(("feed", feed.clone()));
        }
        if let Some(token) = page_token {
            query.push(("page_token", token.to_string()));
        }
        query
    }

    fn fetch_page(
        &self,
        symbol: &str,
        window: &SessionWindow,
        page_token: Option<&str>,
    ) -> Result<BarsPage, ProviderError> {
        let resp = self
            .client
            .get(self.bars_url(symbol))
            .header("APCA-API-KEY-ID", &self.credentials.key_id)
            .header("APCA-API-SECRET-KEY", &self.credentials.secret_key)
            .query(&self.query(window, page_token))
            .send()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_failure(symbol, status, &body));
        }

        parse_page(&body)
    }
}

fn parse_page(body: &str) -> Result<BarsPage, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))
}

fn classify_failure(symbol: &str, status: reqwest::StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            ProviderError::Unauthorized(message)
        }
        reqwest::StatusCode::NOT_FOUND => ProviderError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        _ => ProviderError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

impl BarProvider for AlpacaProvider {
    fn name(&self) -> &str {
        "alpaca"
    }

    fn source(&self) -> DataSource {
        DataSource::Alpaca
    }

    fn fetch_minute_bars(
        &self,
        symbol: &str,
        window: &SessionWindow,
    ) -> Result<Vec<MinuteBar>, ProviderError> {
        let mut bars = Vec::with_capacity(window.minute_count());
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.fetch_page(symbol, window, page_token.as_deref())?;
            pages += 1;
            bars.extend(page.bars.unwrap_or_default().into_iter().map(MinuteBar::from));

            match page.next_page_token {
                Some(next) if Some(&next) == page_token.as_ref() => {
                    return Err(ProviderError::Decode(format!(
                        "provider repeated page token '{next}' for {symbol}"
                    )));
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        tracing::debug!(symbol, pages, bars = bars.len(), "fetched minute bars from alpaca");
        Ok(bars)
    }
}
