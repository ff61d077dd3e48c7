//! Single-file Parquet cache.
//!
//! Layout: `{cache_dir}/{TICKER}.parquet`
//!
//! - One file per ticker holding its full ordered price history
//! - Whole-file overwrite only; never appended, merged, or deleted
//! - Atomic writes (write to .tmp, rename into place)
//! - Schema check on load against [`PRICE_SCHEMA`](crate::schema::PRICE_SCHEMA)

use super::provider::DataError;
use crate::config::StorageConfig;
use crate::domain::PriceRecord;
use crate::schema::validate_frame;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// `NaiveDate::num_days_from_ce` of 1970-01-01; Parquet dates count days from it.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// The Parquet cache.
#[derive(Debug, Clone)]
pub struct ParquetCache {
    cache_dir: PathBuf,
}

impl ParquetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.dir)
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Create the cache directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<(), DataError> {
        fs::create_dir_all(&self.cache_dir)?;
        Ok(())
    }

    /// Path to the Parquet file for a ticker: `{cache_dir}/{TICKER}.parquet`
    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.cache_dir.join(format!("{ticker}.parquet"))
    }

    pub fn exists(&self, ticker: &str) -> bool {
        self.path_for(ticker).is_file()
    }

    /// Replace the cached history for `ticker` with `records`.
    ///
    /// Writes are atomic: write to .tmp then rename. Returns the final path.
    pub fn write(&self, ticker: &str, records: &[PriceRecord]) -> Result<PathBuf, DataError> {
        self.ensure_dir()?;

        let mut df = records_to_dataframe(records)?;
        let path = self.path_for(ticker);
        replace_atomically(&path, |tmp_path| write_parquet(&mut df, tmp_path))?;

        tracing::debug!(ticker, rows = records.len(), path = %path.display(), "wrote cache file");
        Ok(path)
    }

    /// Load the cached table for `ticker`, or `None` when no file exists.
    pub fn load(&self, ticker: &str) -> Result<Option<DataFrame>, DataError> {
        let path = self.path_for(ticker);
        if !path.is_file() {
            return Ok(None);
        }
        load_and_validate_parquet(&path).map(Some)
    }

    /// Load and convert back to records.
    pub fn load_records(&self, ticker: &str) -> Result<Option<Vec<PriceRecord>>, DataError> {
        self.load(ticker)?
            .map(|df| dataframe_to_records(&df))
            .transpose()
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn days_to_date(days: i32) -> Result<NaiveDate, DataError> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| DataError::Parquet(format!("date out of range: {days} days since epoch")))
}

fn f64_column(name: &str, records: &[PriceRecord], get: fn(&PriceRecord) -> f64) -> Column {
    let values: Vec<f64> = records.iter().map(get).collect();
    Column::new(name.into(), values)
}

fn i64_column(name: &str, records: &[PriceRecord], get: fn(&PriceRecord) -> i64) -> Column {
    let values: Vec<i64> = records.iter().map(get).collect();
    Column::new(name.into(), values)
}

/// Convert price records to a DataFrame with the fixed column schema.
pub fn records_to_dataframe(records: &[PriceRecord]) -> Result<DataFrame, DataError> {
    let dates: Vec<i32> = records.iter().map(|r| date_to_days(r.date)).collect();

    let df = DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Parquet(format!("date cast: {e}")))?,
        f64_column("open", records, |r| r.open),
        f64_column("high", records, |r| r.high),
        f64_column("low", records, |r| r.low),
        f64_column("close", records, |r| r.close),
        i64_column("volume", records, |r| r.volume),
        f64_column("adjusted_open", records, |r| r.adjusted_open),
        f64_column("adjusted_high", records, |r| r.adjusted_high),
        f64_column("adjusted_low", records, |r| r.adjusted_low),
        f64_column("adjusted_close", records, |r| r.adjusted_close),
        i64_column("adjusted_volume", records, |r| r.adjusted_volume),
        f64_column("dividend_cash", records, |r| r.dividend_cash),
        f64_column("split_factor", records, |r| r.split_factor),
    ])
    .map_err(|e| DataError::Parquet(format!("dataframe creation: {e}")))?;

    ensure_schema(&df)?;
    Ok(df)
}

fn ensure_schema(df: &DataFrame) -> Result<(), DataError> {
    let validation = validate_frame(df);
    if validation.is_valid {
        Ok(())
    } else {
        Err(DataError::Schema(validation.errors.join("; ")))
    }
}

/// Write `path` via a sibling `.tmp` file renamed into place.
///
/// On any failure the tmp file is removed and `path` is left as it was.
fn replace_atomically<F>(path: &Path, write: F) -> Result<(), DataError>
where
    F: FnOnce(&Path) -> Result<(), DataError>,
{
    let tmp_path = path.with_extension("parquet.tmp");
    let result = write(&tmp_path).and_then(|()| fs::rename(&tmp_path, path).map_err(DataError::Io));
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Write a DataFrame to a Parquet file.
fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), DataError> {
    let file = fs::File::create(path)?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| DataError::Parquet(format!("write parquet: {e}")))?;
    Ok(())
}

/// Load a Parquet file and validate it against the schema.
fn load_and_validate_parquet(path: &Path) -> Result<DataFrame, DataError> {
    let file = fs::File::open(path)?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::Parquet(format!("read {}: {e}", path.display())))?;
    ensure_schema(&df)?;
    Ok(df)
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, DataError> {
    df.column(name)
        .map_err(|e| DataError::Schema(format!("column '{name}': {e}")))
}

fn non_null<T>(value: Option<T>, name: &str, row: usize) -> Result<T, DataError> {
    value.ok_or_else(|| DataError::Schema(format!("null {name} at row {row}")))
}

/// Smallest and largest `date` in a price table, or `None` when it has no rows.
pub fn date_bounds(df: &DataFrame) -> Result<Option<(NaiveDate, NaiveDate)>, DataError> {
    let dates = column(df, "date")?
        .date()
        .map_err(|e| DataError::Schema(format!("date column type: {e}")))?;

    let physical: &Int32Chunked = dates;

    match (physical.min(), physical.max()) {
        (Some(lo), Some(hi)) => Ok(Some((days_to_date(lo)?, days_to_date(hi)?))),
        _ => Ok(None),
    }
}

/// Convert a price table back to records.
pub fn dataframe_to_records(df: &DataFrame) -> Result<Vec<PriceRecord>, DataError> {
    let f64s = |name: &str| -> Result<Float64Chunked, DataError> {
        column(df, name)?
            .f64()
            .cloned()
            .map_err(|e| DataError::Schema(format!("{name} column type: {e}")))
    };
    let i64s = |name: &str| -> Result<Int64Chunked, DataError> {
        column(df, name)?
            .i64()
            .cloned()
            .map_err(|e| DataError::Schema(format!("{name} column type: {e}")))
    };

    let date_ca = column(df, "date")?
        .date()
        .map_err(|e| DataError::Schema(format!("date column type: {e}")))?;
    let open = f64s("open")?;
    let high = f64s("high")?;
    let low = f64s("low")?;
    let close = f64s("close")?;
    let volume = i64s("volume")?;
    let adj_open = f64s("adjusted_open")?;
    let adj_high = f64s("adjusted_high")?;
    let adj_low = f64s("adjusted_low")?;
    let adj_close = f64s("adjusted_close")?;
    let adj_volume = i64s("adjusted_volume")?;
    let div_cash = f64s("dividend_cash")?;
    let split = f64s("split_factor")?;

    let n = df.height();
    let mut records = Vec::with_capacity(n);
    for i in 0..n {
        records.push(PriceRecord {
            date: days_to_date(non_null(date_ca.get(i), "date", i)?)?,
            open: non_null(open.get(i), "open", i)?,
            high: non_null(high.get(i), "high", i)?,
            low: non_null(low.get(i), "low", i)?,
            close: non_null(close.get(i), "close", i)?,
            volume: non_null(volume.get(i), "volume", i)?,
            adjusted_open: non_null(adj_open.get(i), "adjusted_open", i)?,
            adjusted_high: non_null(adj_high.get(i), "adjusted_high", i)?,
            adjusted_low: non_null(adj_low.get(i), "adjusted_low", i)?,
            adjusted_close: non_null(adj_close.get(i), "adjusted_close", i)?,
            adjusted_volume: non_null(adj_volume.get(i), "adjusted_volume", i)?,
            dividend_cash: non_null(div_cash.get(i), "dividend_cash", i)?,
            split_factor: non_null(split.get(i), "split_factor", i)?,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(y: i32, m: u32, d: u32, close: f64) -> PriceRecord {
        PriceRecord {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            open: close - 1.0,
            high: close + 1.5,
            low: close - 2.0,
            close,
            volume: 1_000_000,
            adjusted_open: (close - 1.0) * 0.98,
            adjusted_high: (close + 1.5) * 0.98,
            adjusted_low: (close - 2.0) * 0.98,
            adjusted_close: close * 0.98,
            adjusted_volume: 1_020_408,
            dividend_cash: 0.0,
            split_factor: 1.0,
        }
    }

    fn sample_records() -> Vec<PriceRecord> {
        vec![record(2024, 1, 2, 101.0), record(2024, 1, 3, 102.0)]
    }

    #[test]
    fn path_is_ticker_dot_parquet() {
        let cache = ParquetCache::new("/tmp/prices");
        assert_eq!(cache.path_for("QQQ"), PathBuf::from("/tmp/prices/QQQ.parquet"));
        assert_eq!(cache.cache_dir(), Path::new("/tmp/prices"));
    }

    #[test]
    fn write_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cache = ParquetCache::new(dir.path());

        let path = cache.write("SPY", &sample_records()).unwrap();
        assert_eq!(path, dir.path().join("SPY.parquet"));
        assert!(cache.exists("SPY"));

        let loaded = cache.load_records("SPY").unwrap().unwrap();
        assert_eq!(loaded, sample_records());
    }

    #[test]
    fn write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.write("SPY", &sample_records()).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["SPY.parquet".to_string()]);
    }

    #[test]
    fn write_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/.prices");
        let cache = ParquetCache::new(&nested);
        cache.write("QQQ", &sample_records()).unwrap();
        assert!(nested.join("QQQ.parquet").is_file());
    }

    #[test]
    fn write_overwrites_wholesale() {
        let dir = TempDir::new().unwrap();
        let cache = ParquetCache::new(dir.path());

        cache.write("SPY", &sample_records()).unwrap();
        let replacement = vec![record(2023, 6, 1, 90.0)];
        cache.write("SPY", &replacement).unwrap();

        assert_eq!(cache.load_records("SPY").unwrap().unwrap(), replacement);
    }

    #[test]
    fn failed_write_removes_tmp_and_keeps_target() {
        let dir = TempDir::new().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.write("SPY", &sample_records()).unwrap();
        let path = cache.path_for("SPY");
        let before = fs::read(&path).unwrap();

        let err = replace_atomically(&path, |tmp| {
            fs::write(tmp, b"partial")?;
            Err(DataError::Parquet("encoder failed".into()))
        })
        .unwrap_err();

        assert!(matches!(err, DataError::Parquet(_)));
        assert!(!path.with_extension("parquet.tmp").exists());
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn failed_rename_removes_tmp() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory at the target path makes the rename fail.
        let path = dir.path().join("SPY.parquet");
        fs::create_dir_all(path.join("occupied")).unwrap();

        let err = replace_atomically(&path, |tmp| {
            fs::write(tmp, b"data")?;
            Ok(())
        })
        .unwrap_err();

        assert!(matches!(err, DataError::Io(_)));
        assert!(!path.with_extension("parquet.tmp").exists());
    }

    #[test]
    fn load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let cache = ParquetCache::new(dir.path());
        assert!(cache.load("NONEXISTENT").unwrap().is_none());
        assert!(!cache.exists("NONEXISTENT"));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cache = ParquetCache::new(dir.path());
        fs::write(cache.path_for("SPY"), b"not parquet").unwrap();

        let err = cache.load("SPY").unwrap_err();
        assert!(matches!(err, DataError::Parquet(_)), "{err:?}");
    }

    #[test]
    fn foreign_schema_is_rejected() {
        let dir = TempDir::new().unwrap();
        let cache = ParquetCache::new(dir.path());

        let mut df = polars::df!(
            "date" => &["2024-01-02"],
            "close" => &[1.0],
        )
        .unwrap();
        write_parquet(&mut df, &cache.path_for("SPY")).unwrap();

        let err = cache.load("SPY").unwrap_err();
        assert!(matches!(err, DataError::Schema(_)), "{err:?}");
    }

    #[test]
    fn frame_has_fixed_column_order_and_types() {
        let df = records_to_dataframe(&sample_records()).unwrap();
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, crate::schema::column_names());
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);
        assert_eq!(df.column("volume").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("split_factor").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn empty_history_keeps_schema() {
        let dir = TempDir::new().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.write("NEW", &[]).unwrap();

        let df = cache.load("NEW").unwrap().unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 13);
        assert_eq!(date_bounds(&df).unwrap(), None);
    }

    #[test]
    fn bounds_are_min_and_max_date() {
        let records = vec![
            record(2024, 1, 3, 102.0),
            record(2023, 12, 29, 99.0),
            record(2024, 1, 2, 101.0),
        ];
        let df = records_to_dataframe(&records).unwrap();
        assert_eq!(
            date_bounds(&df).unwrap(),
            Some((
                NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
            ))
        );
    }

    #[test]
    fn epoch_conversion() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(date_to_days(epoch), 0);
        assert_eq!(days_to_date(0).unwrap(), epoch);
        assert_eq!(
            days_to_date(date_to_days(NaiveDate::from_ymd_opt(1999, 3, 10).unwrap())).unwrap(),
            NaiveDate::from_ymd_opt(1999, 3, 10).unwrap()
        );
        assert_eq!(days_to_date(-1).unwrap(), NaiveDate::from_ymd_opt(1969, 12, 31).unwrap());
    }
}
