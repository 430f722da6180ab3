//! Event detection over enriched rows.
//!
//! Detection reads only indicator rows; it never sees raw bars, the store or
//! the notifier.

pub mod conditions;
pub mod detector;

pub use detector::{DetectorConfig, DetectorConfigError, SignalDetector};
