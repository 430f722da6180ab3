//! Property tests for runner invariants.
//!
//! 1. Merging: output sorted, timestamps unique, stored bar wins a collision
//! 2. Chunking: chunks concatenate back to the message, none over the limit

use std::collections::HashMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use crosstrend_core::domain::Bar;
use crosstrend_runner::{chunk_message, merge_bars};

// ── Strategies ───────────────────────────────────────────────────────

fn slot(index: u16) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(4 * i64::from(index))
}

/// Bars on arbitrary 4h slots (possibly repeated, in any order), tagged by close.
fn arb_bars(tag: f64) -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec(0u16..64, 0..40).prop_map(move |slots| {
        slots
            .into_iter()
            .map(|s| Bar {
                timestamp: slot(s),
                open: tag,
                high: tag + 1.0,
                low: tag - 1.0,
                close: tag,
                volume: 1.0,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // ── 1. Merging ───────────────────────────────────────────────────

    #[test]
    fn merged_bars_are_sorted_and_unique(stored in arb_bars(1.0), fetched in arb_bars(2.0)) {
        let merged = merge_bars(stored, fetched);
        prop_assert!(merged.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn stored_bar_wins_collision(stored in arb_bars(1.0), fetched in arb_bars(2.0)) {
        let mut expected: HashMap<DateTime<Utc>, f64> = HashMap::new();
        for bar in &fetched {
            expected.insert(bar.timestamp, bar.close);
        }
        for bar in &stored {
            expected.insert(bar.timestamp, bar.close);
        }

        let merged = merge_bars(stored, fetched);
        prop_assert_eq!(merged.len(), expected.len());
        for bar in &merged {
            prop_assert_eq!(Some(&bar.close), expected.get(&bar.timestamp));
        }
    }

    // ── 2. Chunking ──────────────────────────────────────────────────

    #[test]
    fn chunks_rebuild_the_message(text in "\\PC{0,300}", max in 1usize..64) {
        let chunks = chunk_message(&text, max);
        prop_assert_eq!(chunks.concat(), text.clone());
        prop_assert!(chunks.iter().all(|c| c.chars().count() <= max));
        prop_assert!(!chunks.is_empty());
    }
}
