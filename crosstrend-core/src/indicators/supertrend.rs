//! SuperTrend: ATR-based trend line with a carried direction state.
//!
//! Inherently sequential: each bar's trend line and direction depend on the
//! previous bar's. The recurrence runs once, forward, from index 0; the only
//! state carried between bars is `prev_trend` and `prev_dir`.
//!
//! Per bar i >= 1:
//! - candidate = max(up[i], prev_trend) if close > prev_trend, else min(dn[i], prev_trend)
//! - direction = Up if close > candidate, Down if close < candidate, else unchanged
//! - on a flip to Up the line is forced to min(dn[i], prev_trend); on a flip
//!   to Down to max(up[i], prev_trend); otherwise it is the candidate.
//!
//! Seed: trend[0] = dn[0], direction[0] = Up.
//! While the ATR is still warming up the bands are undefined. `min`/`max`
//! keep their first operand unless the second compares strictly better, so an
//! undefined previous line is replaced by the first defined band.

use serde::{Deserialize, Serialize};

use super::atr::true_range;
use super::rolling::{ewm_mean, rolling_mean};
use super::{round2, Indicator};
use crate::domain::{Bar, Direction};

/// How the SuperTrend ATR is smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtrSmoothing {
    /// Exponential smoothing with alpha = 1/period.
    #[default]
    Wilder,
    /// Rolling mean of the last `period` true ranges.
    Simple,
}

#[derive(Debug, Clone)]
pub struct Supertrend {
    atr_period: usize,
    multiplier: f64,
    smoothing: AtrSmoothing,
}

/// All SuperTrend outputs, index-aligned with the input bars.
#[derive(Debug, Clone, PartialEq)]
pub struct SupertrendSeries {
    /// Trend line, rounded to 2 decimals.
    pub trend: Vec<f64>,
    pub direction: Vec<Direction>,
    /// True when the direction differs from the previous bar's (always true at 0).
    pub signal_change: Vec<bool>,
}

impl Supertrend {
    pub fn new(atr_period: usize, multiplier: f64) -> Self {
        Self::with_smoothing(atr_period, multiplier, AtrSmoothing::Wilder)
    }

    pub fn with_smoothing(atr_period: usize, multiplier: f64, smoothing: AtrSmoothing) -> Self {
        assert!(atr_period >= 1, "Supertrend ATR period must be >= 1");
        Self {
            atr_period,
            multiplier,
            smoothing,
        }
    }

    fn atr(&self, bars: &[Bar]) -> Vec<f64> {
        let tr = true_range(bars);
        match self.smoothing {
            AtrSmoothing::Wilder => ewm_mean(&tr, 1.0 / self.atr_period as f64, self.atr_period),
            AtrSmoothing::Simple => rolling_mean(&tr, self.atr_period),
        }
    }

    pub fn compute_state(&self, bars: &[Bar]) -> SupertrendSeries {
        let n = bars.len();
        let mut trend = Vec::with_capacity(n);
        let mut direction = Vec::with_capacity(n);
        let mut signal_change = Vec::with_capacity(n);

        if n == 0 {
            return SupertrendSeries {
                trend,
                direction,
                signal_change,
            };
        }

        let atr = self.atr(bars);
        let up = |i: usize| bars[i].hl2() - self.multiplier * atr[i];
        let dn = |i: usize| bars[i].hl2() + self.multiplier * atr[i];

        let mut prev_trend = dn(0);
        let mut prev_dir = Direction::Up;
        trend.push(prev_trend);
        direction.push(prev_dir);
        signal_change.push(true);

        for i in 1..n {
            let close = bars[i].close;

            let candidate = if close > prev_trend {
                keep_max(up(i), prev_trend)
            } else {
                keep_min(dn(i), prev_trend)
            };

            let dir = if close > candidate {
                Direction::Up
            } else if close < candidate {
                Direction::Down
            } else {
                prev_dir
            };

            let line = match (prev_dir, dir) {
                (Direction::Down, Direction::Up) => keep_min(dn(i), prev_trend),
                (Direction::Up, Direction::Down) => keep_max(up(i), prev_trend),
                _ => candidate,
            };

            trend.push(line);
            direction.push(dir);
            signal_change.push(dir != prev_dir);

            prev_trend = line;
            prev_dir = dir;
        }

        for v in trend.iter_mut() {
            *v = round2(*v);
        }

        SupertrendSeries {
            trend,
            direction,
            signal_change,
        }
    }
}

/// `a` unless `b` is strictly greater.
fn keep_max(a: f64, b: f64) -> f64 {
    if b > a {
        b
    } else {
        a
    }
}

/// `a` unless `b` is strictly smaller.
fn keep_min(a: f64, b: f64) -> f64 {
    if b < a {
        b
    } else {
        a
    }
}

impl Indicator for Supertrend {
    fn name(&self) -> &str {
        "SuperTrend"
    }

    fn lookback(&self) -> usize {
        self.atr_period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        self.compute_state(bars).trend
    }
}
