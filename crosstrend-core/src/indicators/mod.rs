//! Concrete indicator implementations.
//!
//! Every column the engine produces is backed by a type implementing
//! [`Indicator`]: bar history in, numeric series of the same length out.
//! Values inside an indicator's warmup are `f64::NAN`.
//!
//! Multi-output indicators expose their extra state through dedicated
//! functions (`Supertrend::compute_state`, `fbb_bands`) so the engine can
//! build all related columns in one pass.

pub mod atr;
pub mod dema;
pub mod ema;
pub mod fbb;
pub mod rolling;
pub mod rsi;
pub mod supertrend;

pub use atr::Atr;
pub use dema::Dema;
pub use ema::Ema;
pub use fbb::{fbb_bands, Fbb, FbbBand};
pub use rsi::Rsi;
pub use supertrend::{AtrSmoothing, Supertrend, SupertrendSeries};

use crate::domain::Bar;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No value at bar t may depend on data from bar t+1 or later. Every
/// indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Column name (e.g., "EMA_20", "ATR").
    fn name(&self) -> &str;

    /// Index of the first bar that can carry a defined value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Round to two decimals, half to even, NaN preserved.
///
/// Columns are rounded as soon as they are produced; downstream comparisons
/// (close vs DEMA, EMA ordering, band breaks) run on the rounded values.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

pub fn round2_all(values: &mut [f64]) {
    for v in values.iter_mut() {
        *v = round2(*v);
    }
}

pub(crate) fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Create synthetic 4-hour bars from close prices for testing.
///
/// open = prev_close (or close for the first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + Duration::hours(4 * i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Bars from explicit (open, high, low, close) tuples, 4 hours apart.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: base + Duration::hours(4 * i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
