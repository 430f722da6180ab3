//! Bar: the fundamental market data unit.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Fixed bar period. Every bar covers the four hours starting at `timestamp`.
pub const BAR_INTERVAL_HOURS: i64 = 4;

/// OHLCV bar for one 4-hour interval.
///
/// `timestamp` is the interval open time in UTC. The bar is only final once
/// the interval has closed, so events derived from it are stamped at
/// [`Bar::close_time`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Why a bar failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarError {
    NonFinite,
    HighBelowLow,
    HighBelowBody,
    LowAboveBody,
    NegativeVolume,
}

impl std::fmt::Display for BarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            BarError::NonFinite => "non-finite OHLCV value",
            BarError::HighBelowLow => "high below low",
            BarError::HighBelowBody => "high below open or close",
            BarError::LowAboveBody => "low above open or close",
            BarError::NegativeVolume => "negative volume",
        };
        f.write_str(text)
    }
}

impl Bar {
    /// Midpoint of the bar's range.
    pub fn hl2(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Close time of the interval (`timestamp + 4h`).
    pub fn close_time(&self) -> DateTime<Utc> {
        self.timestamp + Duration::hours(BAR_INTERVAL_HOURS)
    }

    /// OHLCV sanity check: finite values, high >= low, the body inside the range.
    pub fn check(&self) -> Result<(), BarError> {
        let values = [self.open, self.high, self.low, self.close, self.volume];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(BarError::NonFinite);
        }
        if self.high < self.low {
            return Err(BarError::HighBelowLow);
        }
        if self.high < self.open || self.high < self.close {
            return Err(BarError::HighBelowBody);
        }
        if self.low > self.open || self.low > self.close {
            return Err(BarError::LowAboveBody);
        }
        if self.volume < 0.0 {
            return Err(BarError::NegativeVolume);
        }
        Ok(())
    }

    pub fn is_sane(&self) -> bool {
        self.check().is_ok()
    }
}
