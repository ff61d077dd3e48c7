//! Tiingo end-of-day data provider.
//!
//! Two read-only calls against the daily endpoints: ticker metadata and the
//! daily price history. One blocking attempt per call, no retry. Every request
//! carries the static `Authorization: Token <key>` header.

use super::provider::{DataError, PriceSource};
use crate::config::ProviderConfig;
use crate::domain::{PriceRecord, TickerInfo};
use chrono::NaiveDate;
use reqwest::blocking::{Client, Response};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

/// Production base URL; endpoint paths are appended to it.
pub const DEFAULT_BASE_URL: &str = "https://api.tiingo.com/tiingo";

/// Longest response body echoed into logs and errors.
const MAX_BODY_SNIPPET: usize = 2000;

/// Tiingo REST client for end-of-day metadata and prices.
pub struct TiingoClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TiingoClient {
    /// Client against the production API with no request timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self, DataError> {
        Self::with_options(DEFAULT_BASE_URL, api_key, None)
    }

    /// Client against a custom base URL (used with a local mock server).
    pub fn with_base_url(base_url: &str, api_key: impl Into<String>) -> Result<Self, DataError> {
        Self::with_options(base_url, api_key, None)
    }

    /// Client built from the `[provider]` config section.
    pub fn from_config(config: &ProviderConfig, api_key: impl Into<String>) -> Result<Self, DataError> {
        Self::with_options(
            &config.base_url,
            api_key,
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn with_options(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, DataError> {
        // The blocking client defaults to a 30s timeout; `None` disables it.
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn info_url(&self, ticker: &str) -> String {
        format!("{}/daily/{ticker}", self.base_url)
    }

    fn prices_url(&self, ticker: &str) -> String {
        format!("{}/daily/{ticker}/prices", self.base_url)
    }

    fn send(&self, url: &str, query: &[(&str, String)]) -> Result<Response, DataError> {
        let resp = self
            .client
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Token {}", self.api_key))
            .query(query)
            .send()?;
        Ok(resp)
    }

    /// Fetch metadata for `ticker`.
    ///
    /// Any non-success status is reported as [`DataError::TickerNotFound`]
    /// after logging the status and body.
    pub fn get_ticker_info(&self, ticker: &str) -> Result<TickerInfo, DataError> {
        tracing::info!(ticker, "getting ticker info");
        let resp = self.send(&self.info_url(ticker), &[])?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            tracing::error!(
                ticker,
                status = status.as_u16(),
                body = %truncate_body(&body),
                "failed to get ticker info"
            );
            return Err(DataError::TickerNotFound);
        }

        let body = resp.text()?;
        serde_json::from_str(&body).map_err(|e| malformed("ticker info", e, &body))
    }

    /// Fetch daily prices for `ticker` between `start` and `end` inclusive.
    pub fn get_ticker_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>, DataError> {
        tracing::info!(ticker, %start, %end, "getting ticker prices");
        let query = [
            ("startDate", start.format("%Y-%m-%d").to_string()),
            ("endDate", end.format("%Y-%m-%d").to_string()),
            ("resampleFreq", "daily".to_string()),
        ];
        let resp = self.send(&self.prices_url(ticker), &query)?;

        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!(
                ticker,
                status = status.as_u16(),
                body = %snippet,
                "failed to get ticker prices"
            );
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        serde_json::from_str(&body).map_err(|e| malformed("ticker prices", e, &body))
    }
}

impl PriceSource for TiingoClient {
    fn name(&self) -> &str {
        "tiingo"
    }

    fn ticker_info(&self, ticker: &str) -> Result<TickerInfo, DataError> {
        self.get_ticker_info(ticker)
    }

    fn ticker_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>, DataError> {
        self.get_ticker_prices(ticker, start, end)
    }
}

fn malformed(what: &str, err: serde_json::Error, body: &str) -> DataError {
    DataError::MalformedResponse(format!("{what}: {err} | body: {}", truncate_body(body)))
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_BODY_SNIPPET {
        return body.to_string();
    }
    let mut end = MAX_BODY_SNIPPET;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}
