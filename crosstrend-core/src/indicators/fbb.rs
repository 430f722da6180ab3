//! FBB: volume-weighted moving average of hl2 +/- a multiple of its rolling
//! standard deviation.
//!
//! - vwma = sum(hl2 * volume, length) / sum(volume, length)
//! - std  = sample standard deviation of hl2 over `length`
//! - upper/lower = vwma +/- multiplier * std, rounded to 2 decimals
//!
//! Lookback: length - 1. Undefined where the window's volume sums to zero.

use super::rolling::{rolling_std, rolling_sum};
use super::{round2, Indicator};
use crate::domain::Bar;

/// Which FBB band to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FbbBand {
    Upper,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Fbb {
    length: usize,
    multiplier: f64,
    band: FbbBand,
}

impl Fbb {
    pub fn upper(length: usize, multiplier: f64) -> Self {
        assert!(length >= 1, "FBB length must be >= 1");
        Self {
            length,
            multiplier,
            band: FbbBand::Upper,
        }
    }

    pub fn lower(length: usize, multiplier: f64) -> Self {
        assert!(length >= 1, "FBB length must be >= 1");
        Self {
            length,
            multiplier,
            band: FbbBand::Lower,
        }
    }
}

impl Indicator for Fbb {
    fn name(&self) -> &str {
        match self.band {
            FbbBand::Upper => "FBB_upper",
            FbbBand::Lower => "FBB_lower",
        }
    }

    fn lookback(&self) -> usize {
        self.length - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let (upper, lower) = fbb_bands(bars, self.length, self.multiplier);
        match self.band {
            FbbBand::Upper => upper,
            FbbBand::Lower => lower,
        }
    }
}

/// Both bands in one pass over the rolling sums.
pub fn fbb_bands(bars: &[Bar], length: usize, multiplier: f64) -> (Vec<f64>, Vec<f64>) {
    let hl2: Vec<f64> = bars.iter().map(Bar::hl2).collect();
    let weighted: Vec<f64> = bars.iter().map(|b| b.hl2() * b.volume).collect();
    let volume: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    let weighted_sum = rolling_sum(&weighted, length);
    let volume_sum = rolling_sum(&volume, length);
    let std = rolling_std(&hl2, length);

    let mut upper = vec![f64::NAN; bars.len()];
    let mut lower = vec![f64::NAN; bars.len()];
    for i in 0..bars.len() {
        if volume_sum[i].is_nan() || volume_sum[i] == 0.0 || std[i].is_nan() {
            continue;
        }
        let vwma = weighted_sum[i] / volume_sum[i];
        upper[i] = round2(vwma + multiplier * std[i]);
        lower[i] = round2(vwma - multiplier * std[i]);
    }
    (upper, lower)
}
