//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|), with
//! TR[0] = high-low.
//! Seed: mean of TR[0..window] at index window-1, then
//! ATR[t] = (ATR[t-1] * (window-1) + TR[t]) / window.
//! Lookback: window - 1. Output rounded to 2 decimals.

use super::{round2, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    window: usize,
}

impl Atr {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "ATR window must be >= 1");
        Self { window }
    }
}

/// Compute the True Range series from bars.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let range = bar.high - bar.low;
        if i == 0 {
            tr.push(range);
            continue;
        }
        let pc = bars[i - 1].close;
        tr.push(range.max((bar.high - pc).abs()).max((bar.low - pc).abs()));
    }
    tr
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        "ATR"
    }

    fn lookback(&self) -> usize {
        self.window - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n < self.window {
            return result;
        }

        let tr = true_range(bars);
        let w = self.window as f64;

        let mut prev = tr[..self.window].iter().sum::<f64>() / w;
        result[self.window - 1] = round2(prev);

        for i in self.window..n {
            prev = (prev * (w - 1.0) + tr[i]) / w;
            result[i] = round2(prev);
        }

        result
    }
}
