//! Indicator engine: ordered bars in, enriched rows out.
//!
//! Pure function of its input and parameters:
//!
//! 1. Validate: strictly increasing timestamps, sane OHLCV
//! 2. Check the series covers the largest indicator window
//! 3. Compute every column over the whole series
//! 4. Assemble one `IndicatorRow` per bar

pub mod config;
pub mod precompute;
pub mod validate;

pub use config::{EngineConfig, EngineConfigError, FbbConfig, SupertrendConfig, EMA_WINDOWS};
pub use precompute::IndicatorEngine;
pub use validate::validate_series;
