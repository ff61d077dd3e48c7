//! PriceRecord — one trading day of raw and adjusted OHLCV data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily price row for a single ticker.
///
/// Deserializes from the provider's camelCase keys (`adjOpen`, `divCash`, ...)
/// and serializes with the snake_case names used as cache column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    #[serde(deserialize_with = "super::calendar::deserialize")]
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    #[serde(rename(deserialize = "adjOpen"))]
    pub adjusted_open: f64,
    #[serde(rename(deserialize = "adjHigh"))]
    pub adjusted_high: f64,
    #[serde(rename(deserialize = "adjLow"))]
    pub adjusted_low: f64,
    #[serde(rename(deserialize = "adjClose"))]
    pub adjusted_close: f64,
    #[serde(rename(deserialize = "adjVolume"))]
    pub adjusted_volume: i64,
    #[serde(rename(deserialize = "divCash"))]
    pub dividend_cash: f64,
    #[serde(rename(deserialize = "splitFactor"))]
    pub split_factor: f64,
}

impl PriceRecord {
    /// Map one element of the provider's price array.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// True when a cash dividend was paid on this date.
    pub fn has_dividend(&self) -> bool {
        self.dividend_cash != 0.0
    }

    /// True when a split took effect on this date.
    pub fn has_split(&self) -> bool {
        self.split_factor != 1.0
    }
}
