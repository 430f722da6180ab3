//! IndicatorRow: a bar plus every derived indicator column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bar::Bar;

/// SuperTrend direction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// +1 for `Up`, -1 for `Down`.
    pub fn as_i8(self) -> i8 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }

    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            1 => Some(Direction::Up),
            -1 => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn signal(self) -> TrendSignal {
        match self {
            Direction::Up => TrendSignal::Buy,
            Direction::Down => TrendSignal::Sell,
        }
    }
}

/// Label attached to a SuperTrend direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendSignal {
    Buy,
    Sell,
}

impl TrendSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendSignal::Buy => "Buy",
            TrendSignal::Sell => "Sell",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "Buy" => Some(TrendSignal::Buy),
            "Sell" => Some(TrendSignal::Sell),
            _ => None,
        }
    }
}

/// One enriched bar.
///
/// Numeric indicator fields are `f64::NAN` until enough history exists for
/// their window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub bar: Bar,
    pub rsi: f64,
    pub atr: f64,
    pub ema_20: f64,
    pub ema_50: f64,
    pub ema_200: f64,
    pub dema: f64,
    pub supertrend: f64,
    pub direction: Direction,
    pub signal: Option<TrendSignal>,
    pub signal_change: bool,
    pub fbb_upper: f64,
    pub fbb_lower: f64,
}

impl IndicatorRow {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.bar.timestamp
    }

    /// True when every numeric indicator column is defined.
    pub fn is_complete(&self) -> bool {
        [
            self.rsi,
            self.atr,
            self.ema_20,
            self.ema_50,
            self.ema_200,
            self.dema,
            self.supertrend,
            self.fbb_upper,
            self.fbb_lower,
        ]
        .iter()
        .all(|v| !v.is_nan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_round_trips_through_i8() {
        assert_eq!(Direction::from_i8(Direction::Up.as_i8()), Some(Direction::Up));
        assert_eq!(
            Direction::from_i8(Direction::Down.as_i8()),
            Some(Direction::Down)
        );
        assert_eq!(Direction::from_i8(0), None);
    }

    #[test]
    fn direction_maps_to_signal() {
        assert_eq!(Direction::Up.signal(), TrendSignal::Buy);
        assert_eq!(Direction::Down.signal(), TrendSignal::Sell);
    }

    #[test]
    fn signal_parse() {
        assert_eq!(TrendSignal::parse("Buy"), Some(TrendSignal::Buy));
        assert_eq!(TrendSignal::parse("Sell"), Some(TrendSignal::Sell));
        assert_eq!(TrendSignal::parse("Hold"), None);
    }
}
