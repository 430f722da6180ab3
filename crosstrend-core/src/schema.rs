//! Persisted record contract: the boundary between the engine and the store.
//!
//! One `StoredRecord` per enriched bar. Field names and the timestamp layout
//! are fixed so records written by one run can be read back by the next:
//!
//! - `timestamp`: bar open time, UTC, `%Y-%m-%d %H:%M:%S`
//! - `open`, `high`, `low`, `close`, `volume`: raw bar values
//! - `indicators`: `RSI`, `ATR`, `EMA_20`, `EMA_50`, `EMA_200`, `DEMA`,
//!   `SuperTrend`, `Direction` (+1/-1), `Signal` (`Buy`/`Sell`/null),
//!   `SignalChange`, `FBB_upper`, `FBB_lower`
//!
//! Undefined (warmup) values are written as `null`.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, Direction, IndicatorRow, TrendSignal, TIMESTAMP_FORMAT};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unparseable timestamp '{0}' (expected YYYY-MM-DD HH:MM:SS)")]
    Timestamp(String),
    #[error("direction must be 1 or -1, got {0}")]
    Direction(i8),
}

/// Indicator block of a stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredIndicators {
    #[serde(rename = "RSI")]
    pub rsi: Option<f64>,
    #[serde(rename = "ATR")]
    pub atr: Option<f64>,
    #[serde(rename = "EMA_20")]
    pub ema_20: Option<f64>,
    #[serde(rename = "EMA_50")]
    pub ema_50: Option<f64>,
    #[serde(rename = "EMA_200")]
    pub ema_200: Option<f64>,
    #[serde(rename = "DEMA")]
    pub dema: Option<f64>,
    #[serde(rename = "SuperTrend")]
    pub supertrend: Option<f64>,
    #[serde(rename = "Direction")]
    pub direction: i8,
    #[serde(rename = "Signal")]
    pub signal: Option<TrendSignal>,
    #[serde(rename = "SignalChange")]
    pub signal_change: bool,
    #[serde(rename = "FBB_upper")]
    pub fbb_upper: Option<f64>,
    #[serde(rename = "FBB_lower")]
    pub fbb_lower: Option<f64>,
}

/// One persisted enriched bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub indicators: StoredIndicators,
}

fn defined(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn undefined_as_nan(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, SchemaError> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| SchemaError::Timestamp(text.to_string()))
}

impl From<&IndicatorRow> for StoredRecord {
    fn from(row: &IndicatorRow) -> Self {
        Self {
            timestamp: format_timestamp(row.bar.timestamp),
            open: row.bar.open,
            high: row.bar.high,
            low: row.bar.low,
            close: row.bar.close,
            volume: row.bar.volume,
            indicators: StoredIndicators {
                rsi: defined(row.rsi),
                atr: defined(row.atr),
                ema_20: defined(row.ema_20),
                ema_50: defined(row.ema_50),
                ema_200: defined(row.ema_200),
                dema: defined(row.dema),
                supertrend: defined(row.supertrend),
                direction: row.direction.as_i8(),
                signal: row.signal,
                signal_change: row.signal_change,
                fbb_upper: defined(row.fbb_upper),
                fbb_lower: defined(row.fbb_lower),
            },
        }
    }
}

impl StoredRecord {
    pub fn parsed_timestamp(&self) -> Result<DateTime<Utc>, SchemaError> {
        parse_timestamp(&self.timestamp)
    }

    /// The raw bar this record was computed from.
    pub fn to_bar(&self) -> Result<Bar, SchemaError> {
        Ok(Bar {
            timestamp: self.parsed_timestamp()?,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }

    /// Rebuild the enriched row; `null` values come back as NaN.
    pub fn to_row(&self) -> Result<IndicatorRow, SchemaError> {
        let ind = &self.indicators;
        let direction =
            Direction::from_i8(ind.direction).ok_or(SchemaError::Direction(ind.direction))?;
        Ok(IndicatorRow {
            bar: self.to_bar()?,
            rsi: undefined_as_nan(ind.rsi),
            atr: undefined_as_nan(ind.atr),
            ema_20: undefined_as_nan(ind.ema_20),
            ema_50: undefined_as_nan(ind.ema_50),
            ema_200: undefined_as_nan(ind.ema_200),
            dema: undefined_as_nan(ind.dema),
            supertrend: undefined_as_nan(ind.supertrend),
            direction,
            signal: ind.signal,
            signal_change: ind.signal_change,
            fbb_upper: undefined_as_nan(ind.fbb_upper),
            fbb_lower: undefined_as_nan(ind.fbb_lower),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> IndicatorRow {
        IndicatorRow {
            bar: Bar {
                timestamp: Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap(),
                open: 100.0,
                high: 105.0,
                low: 98.0,
                close: 103.5,
                volume: 1234.5,
            },
            rsi: 61.27,
            atr: 3.4,
            ema_20: 101.1,
            ema_50: 99.8,
            ema_200: f64::NAN,
            dema: f64::NAN,
            supertrend: 95.25,
            direction: Direction::Up,
            signal: Some(TrendSignal::Buy),
            signal_change: false,
            fbb_upper: f64::NAN,
            fbb_lower: f64::NAN,
        }
    }

    #[test]
    fn field_names_follow_record_layout() {
        let record = StoredRecord::from(&sample_row());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["timestamp"], "2024-05-02 08:00:00");
        let ind = &value["indicators"];
        for key in [
            "RSI", "ATR", "EMA_20", "EMA_50", "EMA_200", "DEMA", "SuperTrend", "Direction",
            "Signal", "SignalChange", "FBB_upper", "FBB_lower",
        ] {
            assert!(ind.get(key).is_some(), "missing {key}");
        }
        assert_eq!(ind["Direction"], 1);
        assert_eq!(ind["Signal"], "Buy");
        assert!(ind["DEMA"].is_null());
        assert_eq!(ind["RSI"], 61.27);
    }

    #[test]
    fn stored_row_reads_back() {
        let row = sample_row();
        let line = serde_json::to_string(&StoredRecord::from(&row)).unwrap();
        let record: StoredRecord = serde_json::from_str(&line).unwrap();
        let back = record.to_row().unwrap();
        assert_eq!(back.bar, row.bar);
        assert_eq!(back.rsi, row.rsi);
        assert!(back.dema.is_nan());
        assert_eq!(back.direction, Direction::Up);
    }

    #[test]
    fn bad_timestamp_is_reported() {
        let mut record = StoredRecord::from(&sample_row());
        record.timestamp = "2024-05-02T08:00:00Z".into();
        assert_eq!(
            record.to_bar().unwrap_err(),
            SchemaError::Timestamp("2024-05-02T08:00:00Z".into())
        );
    }

    #[test]
    fn bad_direction_is_reported() {
        let mut record = StoredRecord::from(&sample_row());
        record.indicators.direction = 0;
        assert_eq!(record.to_row().unwrap_err(), SchemaError::Direction(0));
    }
}
