//! Price cache core: remote daily prices with a local Parquet cache.
//!
//! - Domain types (price rows, ticker metadata)
//! - Fixed column schema for cached tables
//! - Tiingo end-of-day client behind the `PriceSource` trait
//! - One-file-per-ticker Parquet store
//! - Cached reader keyed on the provider's reported history bounds

pub mod config;
pub mod data;
pub mod domain;
pub mod schema;

pub use config::{AppConfig, ConfigError, LogConfig, ProviderConfig, StorageConfig};
pub use data::{CachedReader, DataError, DataSource, ParquetCache, PriceSource, TiingoClient};
pub use domain::{PriceRecord, TickerInfo};
