//! CrossTrend Core: indicator engine, signal detector, record schema.
//!
//! This crate is the pure computational heart of the alert pipeline:
//! - Domain types (bars, enriched rows, signal events)
//! - Indicator engine: RSI, ATR, EMA, DEMA, SuperTrend, FBB over a 4h series
//! - Signal detector: DEMA/EMA crosses, FBB breaks, composite entries
//! - Stored record contract and series fingerprinting
//!
//! Nothing here touches the network, the filesystem or a clock.

pub mod domain;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod indicators;
pub mod schema;
pub mod signals;
pub mod synthetic;

pub use error::CoreError;
