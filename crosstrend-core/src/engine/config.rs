//! Engine parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::indicators::AtrSmoothing;

/// EMA windows backing the EMA_20 / EMA_50 / EMA_200 columns.
pub const EMA_WINDOWS: [usize; 3] = [20, 50, 200];

/// Parameters the indicators cannot run with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineConfigError {
    #[error("{0} must be >= 1")]
    ZeroWindow(&'static str),

    #[error("fbb.length must be >= 2 (sample standard deviation), got {0}")]
    FbbTooShort(usize),

    #[error("{name} must be > 0, got {value}")]
    NonPositiveMultiplier { name: &'static str, value: f64 },
}

/// SuperTrend parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupertrendConfig {
    pub atr_period: usize,
    pub multiplier: f64,
    pub smoothing: AtrSmoothing,
}

impl Default for SupertrendConfig {
    fn default() -> Self {
        Self {
            atr_period: 12,
            multiplier: 3.0,
            smoothing: AtrSmoothing::Wilder,
        }
    }
}

/// FBB band parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FbbConfig {
    pub length: usize,
    pub multiplier: f64,
}

impl Default for FbbConfig {
    fn default() -> Self {
        Self {
            length: 200,
            multiplier: 3.0,
        }
    }
}

/// Configuration for the indicator engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rsi_window: usize,
    pub atr_window: usize,
    pub dema_length: usize,
    pub supertrend: SupertrendConfig,
    pub fbb: FbbConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rsi_window: 14,
            atr_window: 14,
            dema_length: 200,
            supertrend: SupertrendConfig::default(),
            fbb: FbbConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Largest window any column needs. Fewer input rows than this is
    /// `InsufficientHistory`.
    pub fn required_history(&self) -> usize {
        EMA_WINDOWS
            .iter()
            .copied()
            .chain([
                self.rsi_window,
                self.atr_window,
                self.dema_length,
                self.supertrend.atr_period,
                self.fbb.length,
            ])
            .max()
            .unwrap_or(0)
    }

    /// Reject parameters the indicators cannot run with.
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        let windows = [
            ("rsi_window", self.rsi_window),
            ("atr_window", self.atr_window),
            ("dema_length", self.dema_length),
            ("supertrend.atr_period", self.supertrend.atr_period),
            ("fbb.length", self.fbb.length),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(EngineConfigError::ZeroWindow(name));
            }
        }
        if self.fbb.length < 2 {
            return Err(EngineConfigError::FbbTooShort(self.fbb.length));
        }
        let multipliers = [
            ("supertrend.multiplier", self.supertrend.multiplier),
            ("fbb.multiplier", self.fbb.multiplier),
        ];
        for (name, value) in multipliers {
            if value.is_nan() || value <= 0.0 {
                return Err(EngineConfigError::NonPositiveMultiplier { name, value });
            }
        }
        Ok(())
    }
}
