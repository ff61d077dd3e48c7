//! Cached reader: metadata-fingerprinted, whole-file price cache.
//!
//! Flow for `read(ticker)`:
//! 1. Fetch metadata (failure propagates, nothing touched on disk)
//! 2. Ensure the cache directory exists
//! 3. If a cache file exists and its min/max `date` equal the provider's
//!    `start_date`/`end_date`, return it
//! 4. Otherwise fetch the full range, overwrite the file
//! 5. Reload the file just written and return that
//!
//! Not safe for concurrent callers on the same ticker; there is no locking.

use super::cache::{date_bounds, ParquetCache};
use super::provider::{DataError, DataSource, PriceSource};
use crate::domain::TickerInfo;
use chrono::NaiveDate;
use polars::prelude::DataFrame;

/// How a cache file compares to the provider's reported history bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// No cache file for this ticker.
    Missing,
    /// Cached bounds equal the provider's bounds.
    Fresh,
    /// Cached bounds differ; `cached` is `None` for an empty cached table.
    Stale {
        cached: Option<(NaiveDate, NaiveDate)>,
    },
}

/// Result of a read, with where the table came from.
#[derive(Debug, Clone)]
pub struct ReadResult {
    pub frame: DataFrame,
    pub source: DataSource,
    pub info: TickerInfo,
}

/// Compare a loaded table against provider metadata.
///
/// Strict equality on both bounds: a cache that is wider or narrower than
/// what the provider reports is stale.
pub fn freshness_of(df: &DataFrame, info: &TickerInfo) -> Result<Freshness, DataError> {
    let cached = date_bounds(df)?;
    if cached == Some(info.date_bounds()) {
        Ok(Freshness::Fresh)
    } else {
        Ok(Freshness::Stale { cached })
    }
}

/// Reads a ticker's full price history through the local cache.
pub struct CachedReader<P> {
    source: P,
    cache: ParquetCache,
}

impl<P: PriceSource> CachedReader<P> {
    pub fn new(source: P, cache: ParquetCache) -> Self {
        Self { source, cache }
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    pub fn cache(&self) -> &ParquetCache {
        &self.cache
    }

    /// Full known price history for `ticker` as a table.
    pub fn read(&self, ticker: &str) -> Result<DataFrame, DataError> {
        Ok(self.read_with_source(ticker)?.frame)
    }

    /// Like [`read`](Self::read), also reporting whether the cache was hit.
    pub fn read_with_source(&self, ticker: &str) -> Result<ReadResult, DataError> {
        let info = self.source.ticker_info(ticker)?;
        self.cache.ensure_dir()?;

        if let Some(df) = self.cache.load(ticker)? {
            let freshness = freshness_of(&df, &info)?;
            if freshness == Freshness::Fresh {
                tracing::info!(ticker, rows = df.height(), "cache hit");
                return Ok(ReadResult {
                    frame: df,
                    source: DataSource::Cache,
                    info,
                });
            }
            tracing::info!(
                ticker,
                freshness = ?freshness,
                provider_start = %info.start_date,
                provider_end = %info.end_date,
                "cache stale"
            );
        } else {
            tracing::debug!(ticker, path = %self.cache.path_for(ticker).display(), "cache miss");
        }

        let mut prices = self
            .source
            .ticker_prices(ticker, info.start_date, info.end_date)?;
        prices.sort_by_key(|p| p.date);
        let path = self.cache.write(ticker, &prices)?;
        tracing::info!(ticker, rows = prices.len(), path = %path.display(), "cache refreshed");

        // Return what is on disk so both paths share one decode path.
        let frame = self.cache.load(ticker)?.ok_or_else(|| {
            DataError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("cache file vanished after write: {}", path.display()),
            ))
        })?;

        Ok(ReadResult {
            frame,
            source: DataSource::Provider,
            info,
        })
    }

    /// Report how the cache compares to provider metadata without fetching prices.
    pub fn freshness(&self, ticker: &str, info: &TickerInfo) -> Result<Freshness, DataError> {
        match self.cache.load(ticker)? {
            None => Ok(Freshness::Missing),
            Some(df) => freshness_of(&df, info),
        }
    }
}
