//! Failure kinds surfaced by the indicator engine and the signal detector.
//!
//! Every variant carries enough context (index and/or timestamp) for the caller
//! to classify the failure and report it. Nothing partial is ever returned
//! alongside an error.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::BarError;

/// What made an input series malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// Timestamp equal to the previous bar's.
    DuplicateTimestamp,
    /// Timestamp earlier than the previous bar's.
    OutOfOrder,
    /// OHLCV values violate the bar invariants.
    InvalidBar(BarError),
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedReason::DuplicateTimestamp => f.write_str("duplicate timestamp"),
            MalformedReason::OutOfOrder => f.write_str("timestamp not strictly increasing"),
            MalformedReason::InvalidBar(err) => write!(f, "invalid bar: {err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("insufficient history: {required} rows required, {supplied} supplied")]
    InsufficientHistory { required: usize, supplied: usize },

    #[error("malformed input at index {index} ({timestamp}): {reason}")]
    MalformedInput {
        index: usize,
        timestamp: DateTime<Utc>,
        reason: MalformedReason,
    },

    #[error("reference timestamp {timestamp} not found in enriched series")]
    ReferenceNotFound { timestamp: DateTime<Utc> },

    #[error(
        "insufficient lookback before {timestamp}: {required} rows required, {available} available"
    )]
    InsufficientLookback {
        timestamp: DateTime<Utc>,
        required: usize,
        available: usize,
    },
}

impl CoreError {
    /// Short stable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::InsufficientHistory { .. } => "InsufficientHistory",
            CoreError::MalformedInput { .. } => "MalformedInput",
            CoreError::ReferenceNotFound { .. } => "ReferenceNotFound",
            CoreError::InsufficientLookback { .. } => "InsufficientLookback",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn malformed_message_names_index_and_reason() {
        let err = CoreError::MalformedInput {
            index: 7,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            reason: MalformedReason::InvalidBar(BarError::HighBelowLow),
        };
        let text = err.to_string();
        assert!(text.contains("index 7"), "{text}");
        assert!(text.contains("high below low"), "{text}");
        assert_eq!(err.kind(), "MalformedInput");
    }
}
