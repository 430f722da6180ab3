//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2/(window+1).
//! Seed: the first close itself; the recursion runs from bar 0 but output is
//! masked until `window` closes have been seen.
//! Lookback: window - 1. Output rounded to 2 decimals.

use super::rolling::ewm_mean;
use super::{closes, round2_all, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    window: usize,
    name: String,
}

impl Ema {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "EMA window must be >= 1");
        Self {
            window,
            name: format!("EMA_{window}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = ema_of_series(&closes(bars), self.window);
        round2_all(&mut result);
        result
    }
}

/// Unrounded EMA of an arbitrary series.
///
/// Leading NaNs are skipped: the recursion starts at the first defined value
/// and needs `window` defined values before producing output. This is what
/// lets DEMA take the EMA of an EMA.
pub fn ema_of_series(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return vec![f64::NAN; values.len()];
    }
    let alpha = 2.0 / (window as f64 + 1.0);
    ewm_mean(values, alpha, window)
}
