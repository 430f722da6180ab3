//! Row-level predicates used by the detector.
//!
//! All comparisons treat undefined (NaN) values as false, so a row inside an
//! indicator's warmup never triggers anything.

use crate::domain::IndicatorRow;

/// Close strictly above DEMA.
pub fn price_above_dema(row: &IndicatorRow) -> bool {
    row.bar.close > row.dema
}

/// EMA_20 > EMA_50 >= EMA_200 now, and that ordering did not hold on `prev`.
pub fn golden_cross(row: &IndicatorRow, prev: &IndicatorRow) -> bool {
    let now = row.ema_20 > row.ema_50 && row.ema_50 >= row.ema_200;
    let before = prev.ema_20 <= prev.ema_50 || prev.ema_50 <= prev.ema_200;
    now && before
}

/// EMA_20 < EMA_50 < EMA_200 now, and that ordering did not hold on `prev`.
pub fn death_cross(row: &IndicatorRow, prev: &IndicatorRow) -> bool {
    let now = row.ema_20 < row.ema_50 && row.ema_50 < row.ema_200;
    let before = prev.ema_20 >= prev.ema_50 || prev.ema_50 >= prev.ema_200;
    now && before
}

/// DEMA strictly increasing across `trailing`.
pub fn positive_slope(trailing: &[IndicatorRow]) -> bool {
    trailing.windows(2).all(|w| w[0].dema < w[1].dema)
}

/// DEMA strictly decreasing across `trailing`.
pub fn negative_slope(trailing: &[IndicatorRow]) -> bool {
    trailing.windows(2).all(|w| w[0].dema > w[1].dema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, Direction, TrendSignal};
    use chrono::{TimeZone, Utc};

    fn row(ema_20: f64, ema_50: f64, ema_200: f64, dema: f64) -> IndicatorRow {
        IndicatorRow {
            bar: Bar {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: 1.0,
            },
            rsi: 50.0,
            atr: 1.0,
            ema_20,
            ema_50,
            ema_200,
            dema,
            supertrend: 95.0,
            direction: Direction::Up,
            signal: Some(TrendSignal::Buy),
            signal_change: false,
            fbb_upper: 110.0,
            fbb_lower: 90.0,
        }
    }

    #[test]
    fn golden_cross_needs_new_ordering() {
        let prev = row(100.0, 100.0, 100.0, 100.0);
        let now = row(103.0, 101.0, 100.0, 100.0);
        assert!(golden_cross(&now, &prev));
        // Already ordered on the previous bar: no new cross.
        assert!(!golden_cross(&now, &row(102.0, 101.0, 100.0, 100.0)));
    }

    #[test]
    fn golden_cross_allows_mid_equal_slow() {
        let prev = row(99.0, 100.0, 100.0, 100.0);
        let now = row(101.0, 100.0, 100.0, 100.0);
        assert!(golden_cross(&now, &prev));
    }

    #[test]
    fn death_cross_requires_strict_ordering() {
        let prev = row(100.0, 100.0, 100.0, 100.0);
        assert!(death_cross(&row(97.0, 99.0, 100.0, 100.0), &prev));
        assert!(!death_cross(&row(97.0, 100.0, 100.0, 100.0), &prev));
    }

    #[test]
    fn crosses_are_false_on_undefined_values() {
        let prev = row(f64::NAN, f64::NAN, f64::NAN, f64::NAN);
        let now = row(f64::NAN, 100.0, 99.0, f64::NAN);
        assert!(!golden_cross(&now, &prev));
        assert!(!death_cross(&now, &prev));
        assert!(!price_above_dema(&now));
    }

    #[test]
    fn slope_is_strict() {
        let rising: Vec<_> = [1.0, 2.0, 3.0, 4.0]
            .iter()
            .map(|&d| row(0.0, 0.0, 0.0, d))
            .collect();
        assert!(positive_slope(&rising));
        assert!(!negative_slope(&rising));

        let flat: Vec<_> = [2.0, 2.0, 3.0, 4.0]
            .iter()
            .map(|&d| row(0.0, 0.0, 0.0, d))
            .collect();
        assert!(!positive_slope(&flat));

        let falling: Vec<_> = [4.0, 3.0, 2.0, 1.0]
            .iter()
            .map(|&d| row(0.0, 0.0, 0.0, d))
            .collect();
        assert!(negative_slope(&falling));
    }
}
