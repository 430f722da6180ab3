//! End-to-end: bars through the engine, then the detector.

use chrono::{Duration, TimeZone, Utc};
use crosstrend_core::domain::{Bar, IndicatorRow, SignalEvent, SignalKind};
use crosstrend_core::engine::IndicatorEngine;
use crosstrend_core::signals::SignalDetector;

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + Duration::hours(4 * i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

fn enrich(closes: &[f64]) -> Vec<IndicatorRow> {
    IndicatorEngine::default()
        .enrich(&bars_from_closes(closes))
        .unwrap()
}

fn of_kind(events: &[SignalEvent], kind: SignalKind) -> Vec<&SignalEvent> {
    events.iter().filter(|e| e.kind == kind).collect()
}

/// 450 bars flat at 100, the last one jumping to 200.
#[test]
fn jump_after_flat_history_is_one_golden_cross() {
    let mut closes = vec![100.0; 450];
    closes[449] = 200.0;
    let rows = enrich(&closes);
    let reference = rows[447].timestamp();

    let events = SignalDetector::default().scan(&rows, reference).unwrap();

    let bar450_close = rows[449].timestamp() + Duration::hours(4);
    let golden = of_kind(&events, SignalKind::GoldenCross);
    assert_eq!(golden.len(), 1);
    assert_eq!(golden[0].timestamp, bar450_close);
    assert_eq!(
        golden[0].message,
        format!(
            "Golden cross event at timestamp: {} UTC",
            bar450_close.format("%Y-%m-%d %H:%M:%S")
        )
    );
    // DEMA is flat before the jump, so the slope condition fails.
    assert!(of_kind(&events, SignalKind::LongEntry).is_empty());

    let kinds: Vec<SignalKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SignalKind::FbbUpperBreak,
            SignalKind::FbbUpperBreak,
            SignalKind::GoldenCross,
            SignalKind::DemaCrossUp,
            SignalKind::FbbUpperBreak,
        ]
    );
}

/// Linear decline, then an accelerating recovery.
#[test]
fn recovery_produces_long_entry_with_golden_cross() {
    let mut closes: Vec<f64> = (0..400).map(|i| 400.0 - 0.5 * i as f64).collect();
    let base = closes[399];
    closes.extend((1..=300).map(|j| base + 0.01 * (j * j) as f64));
    let rows = enrich(&closes);

    let events = SignalDetector::default()
        .scan(&rows, rows[402].timestamp())
        .unwrap();

    let long = of_kind(&events, SignalKind::LongEntry);
    let golden = of_kind(&events, SignalKind::GoldenCross);
    assert_eq!(long.len(), 1);
    assert_eq!(golden.len(), 1);
    assert_eq!(long[0].timestamp, golden[0].timestamp);
    assert!(of_kind(&events, SignalKind::ShortEntry).is_empty());
}

/// Linear rise, then an accelerating sell-off.
#[test]
fn sell_off_produces_short_entry_with_death_cross() {
    let mut closes: Vec<f64> = (0..400).map(|i| 100.0 + 0.5 * i as f64).collect();
    let base = closes[399];
    closes.extend((1..=220).map(|j| base - 0.004 * (j * j) as f64));
    let rows = enrich(&closes);

    let events = SignalDetector::default()
        .scan(&rows, rows[402].timestamp())
        .unwrap();

    let short = of_kind(&events, SignalKind::ShortEntry);
    let death = of_kind(&events, SignalKind::DeathCross);
    assert_eq!(short.len(), 1);
    assert_eq!(death.len(), 1);
    assert_eq!(short[0].timestamp, death[0].timestamp);
    assert!(of_kind(&events, SignalKind::LongEntry).is_empty());
}

#[test]
fn rescanning_gives_identical_events() {
    let mut closes = vec![100.0; 450];
    closes[449] = 200.0;
    let rows = enrich(&closes);
    let detector = SignalDetector::default();
    let reference = rows[440].timestamp();
    assert_eq!(
        detector.scan(&rows, reference).unwrap(),
        detector.scan(&rows, reference).unwrap()
    );
}

#[test]
fn events_are_in_chronological_order() {
    let mut closes: Vec<f64> = (0..400).map(|i| 400.0 - 0.5 * i as f64).collect();
    let base = closes[399];
    closes.extend((1..=300).map(|j| base + 0.01 * (j * j) as f64));
    let rows = enrich(&closes);
    let reference = rows[402].timestamp();
    let events = SignalDetector::default().scan(&rows, reference).unwrap();
    assert!(!events.is_empty());
    assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    // Nothing is stamped before the first priming row closes.
    assert!(events[0].timestamp > rows[398].timestamp());
}
