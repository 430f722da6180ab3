//! Indicator precomputation.
//!
//! Every column is computed once over the whole series. Independent columns
//! run in parallel; SuperTrend is a single sequential pass. Rows are assembled
//! only after every column is ready.

use tracing::debug;

use super::config::{EngineConfig, EngineConfigError, EMA_WINDOWS};
use super::validate::validate_series;
use crate::domain::{Bar, IndicatorRow};
use crate::error::CoreError;
use crate::indicators::{fbb_bands, Atr, Dema, Ema, Indicator, Rsi, Supertrend, SupertrendSeries};

/// Computes every indicator column for an ordered bar series.
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    config: EngineConfig,
}

struct Columns {
    rsi: Vec<f64>,
    atr: Vec<f64>,
    ema_20: Vec<f64>,
    ema_50: Vec<f64>,
    ema_200: Vec<f64>,
    dema: Vec<f64>,
    supertrend: SupertrendSeries,
    fbb_upper: Vec<f64>,
    fbb_lower: Vec<f64>,
}

impl IndicatorEngine {
    /// Engine over validated parameters; a zero window or non-positive
    /// multiplier is rejected here rather than failing inside an indicator.
    pub fn new(config: EngineConfig) -> Result<Self, EngineConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Enrich `bars` with every indicator column.
    ///
    /// Returns rows of identical length and order, or an error and nothing.
    pub fn enrich(&self, bars: &[Bar]) -> Result<Vec<IndicatorRow>, CoreError> {
        validate_series(bars)?;

        let required = self.config.required_history();
        if bars.len() < required {
            return Err(CoreError::InsufficientHistory {
                required,
                supplied: bars.len(),
            });
        }

        let columns = self.compute_columns(bars);
        debug!(rows = bars.len(), "indicator columns computed");

        let rows = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let direction = columns.supertrend.direction[i];
                IndicatorRow {
                    bar: *bar,
                    rsi: columns.rsi[i],
                    atr: columns.atr[i],
                    ema_20: columns.ema_20[i],
                    ema_50: columns.ema_50[i],
                    ema_200: columns.ema_200[i],
                    dema: columns.dema[i],
                    supertrend: columns.supertrend.trend[i],
                    direction,
                    signal: Some(direction.signal()),
                    signal_change: columns.supertrend.signal_change[i],
                    fbb_upper: columns.fbb_upper[i],
                    fbb_lower: columns.fbb_lower[i],
                }
            })
            .collect();

        Ok(rows)
    }

    fn compute_columns(&self, bars: &[Bar]) -> Columns {
        let cfg = &self.config;
        let [fast, mid, slow] = EMA_WINDOWS;
        let supertrend = Supertrend::with_smoothing(
            cfg.supertrend.atr_period,
            cfg.supertrend.multiplier,
            cfg.supertrend.smoothing,
        );

        let ((rsi, atr), ((ema_20, ema_50), (ema_200, dema))) = rayon::join(
            || {
                rayon::join(
                    || Rsi::new(cfg.rsi_window).compute(bars),
                    || Atr::new(cfg.atr_window).compute(bars),
                )
            },
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || Ema::new(fast).compute(bars),
                            || Ema::new(mid).compute(bars),
                        )
                    },
                    || {
                        rayon::join(
                            || Ema::new(slow).compute(bars),
                            || Dema::new(cfg.dema_length).compute(bars),
                        )
                    },
                )
            },
        );

        let ((fbb_upper, fbb_lower), supertrend) = rayon::join(
            || fbb_bands(bars, cfg.fbb.length, cfg.fbb.multiplier),
            || supertrend.compute_state(bars),
        );

        Columns {
            rsi,
            atr,
            ema_20,
            ema_50,
            ema_200,
            dema,
            supertrend,
            fbb_upper,
            fbb_lower,
        }
    }
}
