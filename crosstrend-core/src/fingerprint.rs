//! Series fingerprinting: deterministic identity of an enriched series.
//!
//! Two runs over the same bars with the same parameters produce the same
//! fingerprint, so a rerun can be compared against what the store holds.

use blake3::Hasher;
use serde::{Deserialize, Serialize};

use crate::domain::IndicatorRow;
use crate::engine::EngineConfig;

/// Hex-encoded BLAKE3 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesHash(pub String);

impl std::fmt::Display for SeriesHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl SeriesHash {
    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

fn update_f64(hasher: &mut Hasher, value: f64) {
    // Every NaN hashes the same.
    let bits = if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    };
    hasher.update(&bits.to_le_bytes());
}

/// Hash every row in order, including the undefined warmup values.
pub fn hash_rows(rows: &[IndicatorRow]) -> SeriesHash {
    let mut hasher = Hasher::new();
    for row in rows {
        hasher.update(&row.bar.timestamp.timestamp().to_le_bytes());
        for value in [
            row.bar.open,
            row.bar.high,
            row.bar.low,
            row.bar.close,
            row.bar.volume,
            row.rsi,
            row.atr,
            row.ema_20,
            row.ema_50,
            row.ema_200,
            row.dema,
            row.supertrend,
            row.fbb_upper,
            row.fbb_lower,
        ] {
            update_f64(&mut hasher, value);
        }
        hasher.update(&[row.direction.as_i8() as u8, u8::from(row.signal_change)]);
    }
    SeriesHash(hasher.finalize().to_hex().to_string())
}

/// Hash of the engine parameters, from their canonical JSON form.
pub fn hash_config(config: &EngineConfig) -> Result<SeriesHash, serde_json::Error> {
    let json = serde_json::to_string(config)?;
    Ok(SeriesHash(blake3::hash(json.as_bytes()).to_hex().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::IndicatorEngine;
    use crate::indicators::make_bars;

    fn rows() -> Vec<IndicatorRow> {
        let closes: Vec<f64> = (0..220).map(|i| 100.0 + (i as f64 * 0.2).cos() * 4.0).collect();
        IndicatorEngine::default().enrich(&make_bars(&closes)).unwrap()
    }

    #[test]
    fn hashing_is_deterministic() {
        let rows = rows();
        assert_eq!(hash_rows(&rows), hash_rows(&rows.clone()));
        assert_eq!(hash_rows(&rows).0.len(), 64);
    }

    #[test]
    fn any_value_change_changes_hash() {
        let original = rows();
        let mut changed = original.clone();
        changed[150].dema += 0.01;
        assert_ne!(hash_rows(&original), hash_rows(&changed));
    }

    #[test]
    fn config_hash_tracks_parameters() {
        let base = EngineConfig::default();
        let mut other = base.clone();
        other.fbb.multiplier = 2.5;
        assert_eq!(hash_config(&base).unwrap(), hash_config(&base).unwrap());
        assert_ne!(hash_config(&base).unwrap(), hash_config(&other).unwrap());
    }

    #[test]
    fn short_form_is_prefix() {
        let hash = hash_rows(&rows());
        assert!(hash.0.starts_with(hash.short()));
        assert_eq!(hash.short().len(), 12);
    }
}
