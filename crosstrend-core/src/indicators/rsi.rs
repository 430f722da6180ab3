//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Seed: simple mean of the first `window` changes, first value at index `window`.
//! This differs from an `ewm(alpha = 1/window)` recursion started at index 0
//! (with a zero first change) only during warmup; the two agree to two
//! decimals long before the 450-row history the pipeline keeps.
//! Edge case: avg_loss == 0 → RSI = 100 (also when price is flat).
//! Output rounded to 2 decimals.

use super::{round2, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    window: usize,
}

impl Rsi {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "RSI window must be >= 1");
        Self { window }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "RSI"
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.window + 1 {
            return result;
        }

        let changes: Vec<f64> = bars.windows(2).map(|w| w[1].close - w[0].close).collect();

        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for &ch in &changes[..self.window] {
            if ch > 0.0 {
                avg_gain += ch;
            } else {
                avg_loss -= ch;
            }
        }
        avg_gain /= self.window as f64;
        avg_loss /= self.window as f64;

        result[self.window] = round2(compute_rsi(avg_gain, avg_loss));

        let alpha = 1.0 / self.window as f64;
        for i in (self.window + 1)..n {
            let ch = changes[i - 1];
            let gain = ch.max(0.0);
            let loss = (-ch).max(0.0);

            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;

            result[i] = round2(compute_rsi(avg_gain, avg_loss));
        }

        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn rsi_all_gains() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 100.0, 1e-6);
        assert_approx(result[5], 100.0, 1e-6);
    }

    #[test]
    fn rsi_all_losses() {
        let bars = make_bars(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 0.0, 1e-6);
    }

    #[test]
    fn rsi_flat_price_is_100() {
        let bars = make_bars(&[50.0; 6]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[4], 100.0, 1e-6);
    }

    #[test]
    fn seed_converges_to_recursion_from_zero() {
        let closes: Vec<f64> = (0..300)
            .map(|i| 100.0 + 10.0 * (i as f64 * 0.3).sin() + 0.05 * i as f64)
            .collect();
        let result = Rsi::new(14).compute(&make_bars(&closes));

        let alpha = 1.0 / 14.0;
        let (mut up, mut down) = (0.0, 0.0);
        for i in 1..closes.len() {
            let ch = closes[i] - closes[i - 1];
            up = alpha * ch.max(0.0) + (1.0 - alpha) * up;
            down = alpha * (-ch).max(0.0) + (1.0 - alpha) * down;
            if i >= 200 {
                let reference = round2(compute_rsi(up, down));
                assert!(
                    (result[i] - reference).abs() <= 0.010_001,
                    "bar {i}: {} vs {reference}",
                    result[i]
                );
            }
        }
    }

    #[test]
    fn rsi_mixed_seed_value() {
        // Changes: +0.34, -0.25, -0.48 → avg_gain = 0.34/3, avg_loss = 0.73/3
        // RSI = 100 - 100/(1 + 0.34/0.73) = 31.78 (rounded)
        let bars = make_bars(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        let result = Rsi::new(3).compute(&bars);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert_approx(result[3], 31.78, 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let bars = make_bars(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let result = Rsi::new(3).compute(&bars);
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!(
                    (0.0..=100.0).contains(&v),
                    "RSI out of bounds at bar {i}: {v}"
                );
            }
        }
    }

    #[test]
    fn rsi_too_few_bars() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        assert!(Rsi::new(3).compute(&bars).iter().all(|v| v.is_nan()));
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
