//! Seeded random-walk bar generator for demos, benches and tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Bar, BAR_INTERVAL_HOURS};

/// Parameters of a generated series.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub bars: usize,
    pub seed: u64,
    /// Open time of the first bar.
    pub start: DateTime<Utc>,
    pub start_price: f64,
    /// Largest relative close-to-close move per bar.
    pub volatility: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            bars: 500,
            seed: 42,
            start: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            start_price: 40_000.0,
            volatility: 0.02,
        }
    }
}

/// Generate `config.bars` consecutive 4h bars. Same config, same bars.
pub fn random_walk(config: &SyntheticConfig) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut close = config.start_price;
    let step = Duration::hours(BAR_INTERVAL_HOURS);

    (0..config.bars)
        .map(|i| {
            let open = close;
            let change = rng.gen_range(-1.0..=1.0) * config.volatility;
            close = (open * (1.0 + change)).max(0.01);
            let wick_up = rng.gen_range(0.0..=0.5) * config.volatility;
            let wick_down = rng.gen_range(0.0..=0.5) * config.volatility;
            Bar {
                timestamp: config.start + step * i as i32,
                open,
                high: open.max(close) * (1.0 + wick_up),
                low: open.min(close) * (1.0 - wick_down),
                close,
                volume: rng.gen_range(10.0..1_000.0),
            }
        })
        .collect()
}
