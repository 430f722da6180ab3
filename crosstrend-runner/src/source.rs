//! Bar sources: where new completed 4h bars come from.
//!
//! A source only ever hands out closed bars. The candle containing `now` is
//! still forming and is dropped.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crosstrend_core::domain::{Bar, BAR_INTERVAL_HOURS, TIMESTAMP_FORMAT};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read bars from '{path}': {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("row {row}: unrecognised timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can supply completed bars.
pub trait BarSource: Send + Sync {
    fn name(&self) -> &str;

    /// Completed bars with `timestamp > last` (all when `last` is `None`),
    /// in timestamp order, excluding the candle still open at `now`.
    fn fetch_since(
        &self,
        last: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Bar>, SourceError>;
}

/// Open time of the 4h candle containing `now`.
pub fn current_bar_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let period = BAR_INTERVAL_HOURS * 3600;
    let secs = now.timestamp();
    let start = secs - secs.rem_euclid(period);
    Utc.timestamp_opt(start, 0).single().unwrap_or(now)
}

/// Keep bars after `last` whose candle has closed by `now`, sorted.
pub fn completed_since(
    mut bars: Vec<Bar>,
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Vec<Bar> {
    let open_candle = current_bar_start(now);
    bars.retain(|b| last.map_or(true, |l| b.timestamp > l) && b.timestamp < open_candle);
    bars.sort_by_key(|b| b.timestamp);
    bars
}

/// One CSV row: `timestamp,open,high,low,close,volume`.
#[derive(Debug, Serialize, Deserialize)]
struct CsvBar {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Accepts `%Y-%m-%d %H:%M:%S`, RFC 3339, or epoch milliseconds.
pub fn parse_bar_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT) {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    text.parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

/// Read every bar in a CSV file, in file order.
pub fn read_csv(path: &Path) -> Result<Vec<Bar>, SourceError> {
    let csv_err = |source| SourceError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let mut bars = Vec::new();
    for (i, row) in reader.deserialize::<CsvBar>().enumerate() {
        let row = row.map_err(csv_err)?;
        let timestamp =
            parse_bar_timestamp(&row.timestamp).ok_or_else(|| SourceError::Timestamp {
                row: i + 1,
                value: row.timestamp.clone(),
            })?;
        bars.push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    Ok(bars)
}

/// Write bars as CSV with `%Y-%m-%d %H:%M:%S` timestamps.
pub fn write_csv(path: &Path, bars: &[Bar]) -> Result<(), SourceError> {
    let csv_err = |source| SourceError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for bar in bars {
        writer
            .serialize(CsvBar {
                timestamp: bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
            })
            .map_err(csv_err)?;
    }
    writer
        .flush()
        .map_err(|e| csv_err(csv::Error::from(e)))?;
    Ok(())
}

/// Bars from a CSV file, re-read on every fetch.
#[derive(Debug, Clone)]
pub struct CsvBarSource {
    path: PathBuf,
}

impl CsvBarSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BarSource for CsvBarSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_since(
        &self,
        last: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Bar>, SourceError> {
        let all = read_csv(&self.path)?;
        let total = all.len();
        let bars = completed_since(all, last, now);
        debug!(
            path = %self.path.display(),
            total,
            selected = bars.len(),
            "csv bars read"
        );
        Ok(bars)
    }
}

/// In-memory source. Clones share the same bars.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    bars: Arc<Mutex<Vec<Bar>>>,
}

impl MemorySource {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self {
            bars: Arc::new(Mutex::new(bars)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Bar>> {
        self.bars.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, bar: Bar) {
        self.lock().push(bar);
    }
}

impl BarSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch_since(
        &self,
        last: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Bar>, SourceError> {
        Ok(completed_since(self.lock().clone(), last, now))
    }
}
