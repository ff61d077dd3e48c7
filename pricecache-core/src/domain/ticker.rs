//! TickerInfo — provider metadata for a single symbol.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Metadata returned by the per-ticker endpoint.
///
/// `start_date`/`end_date` are the provider's bounds of available history and
/// double as the cache freshness fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerInfo {
    pub ticker: String,
    pub name: String,
    pub exchange_code: String,
    pub description: String,
    #[serde(deserialize_with = "super::calendar::deserialize")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "super::calendar::deserialize")]
    pub end_date: NaiveDate,
}

impl TickerInfo {
    /// Map the provider's metadata object.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// The `(start_date, end_date)` pair compared against the cache.
    pub fn date_bounds(&self) -> (NaiveDate, NaiveDate) {
        (self.start_date, self.end_date)
    }
}
