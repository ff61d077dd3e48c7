//! Remote fetching and local caching

pub mod cache;
pub mod provider;
pub mod reader;
pub mod tiingo;

pub use cache::{dataframe_to_records, date_bounds, records_to_dataframe, ParquetCache};
pub use provider::{DataError, DataSource, PriceSource};
pub use reader::{freshness_of, CachedReader, Freshness, ReadResult};
pub use tiingo::TiingoClient;
