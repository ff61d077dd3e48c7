//! Price cache CLI — read one ticker's daily history through the local cache.
//!
//! Reads the API key from the environment variable named in the config
//! (`TIINGO_API_KEY` by default), refreshes `{storage_dir}/{TICKER}.parquet`
//! if the provider reports a different history range, and prints the table.

mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use pricecache_core::data::{date_bounds, CachedReader, ParquetCache, ReadResult};
use pricecache_core::{AppConfig, TiingoClient};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pricecache",
    about = "Fetch and cache a ticker's full daily price history"
)]
struct Cli {
    /// Ticker symbol to read.
    #[arg(default_value = "QQQ")]
    ticker: String,

    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    logging::init(&config.logging)?;

    let api_key = config.api_key()?;
    let client = TiingoClient::from_config(&config.provider, api_key)?;
    let reader = CachedReader::new(client, ParquetCache::from_config(&config.storage));

    let result = reader
        .read_with_source(&cli.ticker)
        .with_context(|| format!("reading {}", cli.ticker))?;

    print_summary(&cli.ticker, &result)
}

fn print_summary(ticker: &str, result: &ReadResult) -> Result<()> {
    println!("{ticker} ({}): {}", result.info.exchange_code, result.info.name);
    println!("  source: {:?}", result.source);
    println!("  rows:   {}", result.frame.height());
    match date_bounds(&result.frame)? {
        Some((first, last)) => println!("  range:  {first} to {last}"),
        None => println!("  range:  (empty)"),
    }
    println!("{}", result.frame);
    Ok(())
}
