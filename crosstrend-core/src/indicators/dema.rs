//! Double Exponential Moving Average (DEMA).
//!
//! ema1 = EMA(close, length); ema2 = EMA(ema1, length); DEMA = 2*ema1 - ema2.
//! ema2 starts at ema1's first defined value, so the first DEMA value sits at
//! index 2*length - 2. Intermediate EMAs are unrounded; the result is rounded
//! to 2 decimals.

use super::ema::ema_of_series;
use super::{closes, round2, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Dema {
    length: usize,
}

impl Dema {
    pub fn new(length: usize) -> Self {
        assert!(length >= 1, "DEMA length must be >= 1");
        Self { length }
    }
}

impl Indicator for Dema {
    fn name(&self) -> &str {
        "DEMA"
    }

    fn lookback(&self) -> usize {
        2 * self.length - 2
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let ema1 = ema_of_series(&closes(bars), self.length);
        let ema2 = ema_of_series(&ema1, self.length);
        ema1.iter()
            .zip(&ema2)
            .map(|(e1, e2)| round2(2.0 * e1 - e2))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn dema_first_defined_at_twice_length_minus_two() {
        let bars = make_bars(&[100.0; 12]);
        let result = Dema::new(5).compute(&bars);
        for v in &result[..8] {
            assert!(v.is_nan());
        }
        assert_approx(result[8], 100.0, DEFAULT_EPSILON);
        assert_eq!(Dema::new(5).lookback(), 8);
    }

    #[test]
    fn dema_tracks_a_linear_trend_without_lag() {
        // For a linear ramp the EMA lags by a constant at steady state and
        // DEMA cancels that lag, ending much closer to price than ema1.
        let closes: Vec<f64> = (0..200).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let dema = Dema::new(10).compute(&bars);
        let ema = crate::indicators::Ema::new(10).compute(&bars);
        let last = closes.len() - 1;
        assert!((closes[last] - dema[last]).abs() < (closes[last] - ema[last]).abs());
        assert_approx(dema[last], closes[last], 0.02);
    }
}
