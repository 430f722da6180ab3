//! Signal events emitted by the detector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout shared by event messages and stored records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Kind of detected event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    DemaCrossUp,
    DemaCrossDown,
    GoldenCross,
    DeathCross,
    FbbUpperBreak,
    FbbLowerBreak,
    LongEntry,
    ShortEntry,
}

impl SignalKind {
    pub const ALL: [SignalKind; 8] = [
        SignalKind::DemaCrossUp,
        SignalKind::DemaCrossDown,
        SignalKind::GoldenCross,
        SignalKind::DeathCross,
        SignalKind::FbbUpperBreak,
        SignalKind::FbbLowerBreak,
        SignalKind::LongEntry,
        SignalKind::ShortEntry,
    ];

    /// Human-readable lead of the notification text.
    pub fn description(self) -> &'static str {
        match self {
            SignalKind::DemaCrossUp => "Price crossed above DEMA",
            SignalKind::DemaCrossDown => "Price crossed below DEMA",
            SignalKind::GoldenCross => "Golden cross event",
            SignalKind::DeathCross => "Death cross event",
            SignalKind::FbbUpperBreak => "Price crossed upper FBB",
            SignalKind::FbbLowerBreak => "Price crossed lower FBB",
            SignalKind::LongEntry => "Long entry signal",
            SignalKind::ShortEntry => "Short entry signal",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A detected event, stamped at the close time of the bar it was found on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub kind: SignalKind,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl SignalEvent {
    pub fn new(kind: SignalKind, timestamp: DateTime<Utc>) -> Self {
        let message = format!(
            "{} at timestamp: {} UTC",
            kind.description(),
            timestamp.format(TIMESTAMP_FORMAT)
        );
        Self {
            kind,
            timestamp,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn message_carries_kind_and_close_time() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let event = SignalEvent::new(SignalKind::GoldenCross, ts);
        assert_eq!(
            event.message,
            "Golden cross event at timestamp: 2024-03-01 08:00:00 UTC"
        );
    }

    #[test]
    fn every_kind_has_a_distinct_description() {
        let mut seen = std::collections::HashSet::new();
        for kind in SignalKind::ALL {
            assert!(seen.insert(kind.description()));
        }
    }
}
