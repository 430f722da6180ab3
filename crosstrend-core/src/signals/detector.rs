//! Signal detection over an enriched series.
//!
//! The scan starts `lead_rows` bars before the reference so the DEMA-cross
//! state is primed, and the gated detectors (crosses, FBB breaks, entries)
//! only fire from the reference onwards. Every event is stamped with the
//! bar's close time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::conditions::{
    death_cross, golden_cross, negative_slope, positive_slope, price_above_dema,
};
use crate::domain::{Direction, IndicatorRow, SignalEvent, SignalKind};
use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectorConfigError {
    #[error("lead_rows must be >= 2, got {0}")]
    LeadTooShort(usize),
}

/// Detector parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Rows before the reference that must exist. Also the DEMA slope window.
    pub lead_rows: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self { lead_rows: 4 }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), DetectorConfigError> {
        if self.lead_rows < 2 {
            return Err(DetectorConfigError::LeadTooShort(self.lead_rows));
        }
        Ok(())
    }
}

/// Scans enriched rows for crossover, band-break and entry events.
#[derive(Debug, Clone, Default)]
pub struct SignalDetector {
    config: DetectorConfig,
}

impl SignalDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect every event from the row at `reference` to the end of `rows`.
    ///
    /// Events come back in row order. Within a row the order is golden
    /// cross, death cross, DEMA cross, FBB break, entry.
    pub fn scan(
        &self,
        rows: &[IndicatorRow],
        reference: DateTime<Utc>,
    ) -> Result<Vec<SignalEvent>, CoreError> {
        let start = rows
            .iter()
            .position(|row| row.timestamp() == reference)
            .ok_or(CoreError::ReferenceNotFound {
                timestamp: reference,
            })?;

        let lead = self.config.lead_rows;
        if start < lead {
            return Err(CoreError::InsufficientLookback {
                timestamp: reference,
                required: lead,
                available: start,
            });
        }

        let mut events = Vec::new();
        let mut prev_above = None;
        for i in (start - lead)..rows.len() {
            let trailing = (i >= start).then(|| &rows[i - lead..i]);
            let above = detect_row(&rows[i], trailing, prev_above, &mut events);
            prev_above = Some(above);
        }

        debug!(
            reference = %reference,
            scanned = rows.len() - start,
            events = events.len(),
            "signal scan complete"
        );
        Ok(events)
    }
}

/// Run every detector for one row. `trailing` is the window of rows just
/// before `row`; it is absent while priming. Returns whether close was above
/// DEMA so the caller can carry the state.
fn detect_row(
    row: &IndicatorRow,
    trailing: Option<&[IndicatorRow]>,
    prev_above: Option<bool>,
    out: &mut Vec<SignalEvent>,
) -> bool {
    let at = row.bar.close_time();
    let above = price_above_dema(row);

    let prev_row = trailing.and_then(|t| t.last());
    let (golden, death) = match prev_row {
        Some(prev) => (golden_cross(row, prev), death_cross(row, prev)),
        None => (false, false),
    };

    if golden {
        out.push(SignalEvent::new(SignalKind::GoldenCross, at));
    }
    if death {
        out.push(SignalEvent::new(SignalKind::DeathCross, at));
    }

    match prev_above {
        Some(false) if above => out.push(SignalEvent::new(SignalKind::DemaCrossUp, at)),
        Some(true) if !above => out.push(SignalEvent::new(SignalKind::DemaCrossDown, at)),
        _ => {}
    }

    let Some(trailing) = trailing else {
        return above;
    };

    if row.bar.high >= row.fbb_upper {
        out.push(SignalEvent::new(SignalKind::FbbUpperBreak, at));
    } else if row.bar.low <= row.fbb_lower {
        out.push(SignalEvent::new(SignalKind::FbbLowerBreak, at));
    }

    if golden && above && row.direction == Direction::Up && positive_slope(trailing) {
        out.push(SignalEvent::new(SignalKind::LongEntry, at));
    } else if death && !above && row.direction == Direction::Down && negative_slope(trailing) {
        out.push(SignalEvent::new(SignalKind::ShortEntry, at));
    }

    above
}
