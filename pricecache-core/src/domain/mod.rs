//! Domain types for the price cache

pub mod calendar;
pub mod price;
pub mod ticker;

pub use price::PriceRecord;
pub use ticker::TickerInfo;
