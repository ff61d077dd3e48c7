//! Price source trait and structured error types.
//!
//! The PriceSource trait abstracts over the remote API so the cached reader can
//! be driven by a fake in tests. The cache layer sits above this trait and
//! providers don't know about the cache.

use crate::domain::{PriceRecord, TickerInfo};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Metadata lookup returned a non-success status.
    #[error("ticker not found")]
    TickerNotFound,

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parquet I/O error: {0}")]
    Parquet(String),

    #[error("cache schema mismatch: {0}")]
    Schema(String),
}

/// Where a returned table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    /// Served from an existing cache file whose bounds matched the provider.
    Cache,
    /// Fetched from the provider and written to the cache.
    Provider,
}

/// Trait for the remote metadata + price history API.
pub trait PriceSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch metadata, including the bounds of available history.
    fn ticker_info(&self, ticker: &str) -> Result<TickerInfo, DataError>;

    /// Fetch daily prices for an inclusive date range.
    fn ticker_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>, DataError>;
}

impl<T: PriceSource + ?Sized> PriceSource for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn ticker_info(&self, ticker: &str) -> Result<TickerInfo, DataError> {
        (**self).ticker_info(ticker)
    }

    fn ticker_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>, DataError> {
        (**self).ticker_prices(ticker, start, end)
    }
}
