//! Input validation: runs before any indicator so a malformed series never
//! produces partial output.

use crate::domain::Bar;
use crate::error::{CoreError, MalformedReason};

/// Check bar invariants and strictly increasing timestamps.
///
/// Gaps between timestamps are allowed; only order and uniqueness are enforced.
pub fn validate_series(bars: &[Bar]) -> Result<(), CoreError> {
    for (index, bar) in bars.iter().enumerate() {
        if let Err(err) = bar.check() {
            return Err(CoreError::MalformedInput {
                index,
                timestamp: bar.timestamp,
                reason: MalformedReason::InvalidBar(err),
            });
        }
        if index == 0 {
            continue;
        }
        let prev = bars[index - 1].timestamp;
        if bar.timestamp == prev {
            return Err(CoreError::MalformedInput {
                index,
                timestamp: bar.timestamp,
                reason: MalformedReason::DuplicateTimestamp,
            });
        }
        if bar.timestamp < prev {
            return Err(CoreError::MalformedInput {
                index,
                timestamp: bar.timestamp,
                reason: MalformedReason::OutOfOrder,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BarError;
    use crate::indicators::make_bars;
    use chrono::Duration;

    #[test]
    fn accepts_increasing_series_with_gap() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0, 4.0]);
        bars[3].timestamp += Duration::hours(40);
        assert!(validate_series(&bars).is_ok());
    }

    #[test]
    fn rejects_duplicate_timestamp() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars[2].timestamp = bars[1].timestamp;
        let err = validate_series(&bars).unwrap_err();
        assert!(matches!(
            err,
            CoreError::MalformedInput {
                index: 2,
                reason: MalformedReason::DuplicateTimestamp,
                ..
            }
        ));
    }

    #[test]
    fn rejects_out_of_order() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars.swap(0, 1);
        let err = validate_series(&bars).unwrap_err();
        assert!(matches!(
            err,
            CoreError::MalformedInput {
                index: 1,
                reason: MalformedReason::OutOfOrder,
                ..
            }
        ));
    }

    #[test]
    fn rejects_broken_ohlc() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0]);
        bars[1].low = bars[1].high + 1.0;
        let err = validate_series(&bars).unwrap_err();
        assert_eq!(
            err,
            CoreError::MalformedInput {
                index: 1,
                timestamp: bars[1].timestamp,
                reason: MalformedReason::InvalidBar(BarError::HighBelowLow),
            }
        );
    }

    #[test]
    fn empty_series_is_valid() {
        assert!(validate_series(&[]).is_ok());
    }
}
