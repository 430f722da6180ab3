//! Run scheduling and the single-flight guard.
//!
//! Runs fire at every `interval_hours` boundary (UTC, day-aligned) plus
//! `offset_minutes`, which leaves time for the exchange to publish the bar
//! that just closed. At most one run executes at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, TryLockError};
use std::time::Duration as StdDuration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::pipeline::Pipeline;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("schedule.interval_hours must divide 24, got {0}")]
    Interval(u32),

    #[error("schedule.offset_minutes ({offset}) must be shorter than the {interval_hours}h interval")]
    Offset { offset: u32, interval_hours: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    pub interval_hours: u32,
    pub offset_minutes: u32,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            interval_hours: 4,
            offset_minutes: 91,
        }
    }
}

impl Schedule {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.interval_hours == 0 || 24 % self.interval_hours != 0 {
            return Err(ScheduleError::Interval(self.interval_hours));
        }
        if self.offset_minutes >= self.interval_hours * 60 {
            return Err(ScheduleError::Offset {
                offset: self.offset_minutes,
                interval_hours: self.interval_hours,
            });
        }
        Ok(())
    }

    /// First scheduled time strictly after `now`.
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let period = i64::from(self.interval_hours.max(1)) * 3600;
        let offset = i64::from(self.offset_minutes) * 60;
        let secs = now.timestamp();
        let slot = (secs - offset).div_euclid(period) * period + offset;
        let next = slot + period;
        Utc.timestamp_opt(next, 0).single().unwrap_or(now)
    }
}

/// Lets one run through at a time; overlapping attempts are skipped.
#[derive(Debug, Default)]
pub struct SingleFlight {
    lock: Mutex<()>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` unless another run holds the guard; `None` when skipped.
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> Option<T> {
        let _guard = match self.lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                warn!("previous run still in progress; skipping");
                return None;
            }
        };
        Some(f())
    }
}

/// Longest single sleep between cancellation checks.
const POLL_INTERVAL: StdDuration = StdDuration::from_secs(30);

/// Run once now, then at every scheduled time until cancelled or `max_runs`
/// runs have been attempted. Failed runs are already reported by the
/// pipeline and do not stop the loop.
pub fn run_scheduled(
    pipeline: &Pipeline,
    schedule: &Schedule,
    guard: &SingleFlight,
    cancel: Option<&AtomicBool>,
    max_runs: Option<usize>,
) -> usize {
    let cancelled = || cancel.is_some_and(|flag| flag.load(Ordering::Relaxed));
    let mut runs = 0;

    loop {
        if cancelled() || max_runs.is_some_and(|max| runs >= max) {
            break;
        }

        let now = Utc::now();
        match guard.run(|| pipeline.run_once(now)) {
            Some(Ok(summary)) => info!(
                new_rows = summary.new_rows,
                events = summary.events.len(),
                "scheduled run complete"
            ),
            Some(Err(e)) => warn!(error = %e, "scheduled run failed"),
            None => {}
        }
        runs += 1;

        if max_runs.is_some_and(|max| runs >= max) {
            break;
        }

        let next = schedule.next_run_after(Utc::now());
        info!(next = %next, "next run scheduled");
        while !cancelled() {
            let remaining = next - Utc::now();
            let Ok(remaining) = remaining.to_std() else {
                break;
            };
            if remaining.is_zero() {
                break;
            }
            std::thread::sleep(remaining.min(POLL_INTERVAL));
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn at(d: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, h, m, s).unwrap()
    }

    #[test]
    fn next_run_is_boundary_plus_offset() {
        let schedule = Schedule::default();
        assert_eq!(schedule.next_run_after(at(1, 0, 0, 0)), at(1, 1, 31, 0));
        assert_eq!(schedule.next_run_after(at(1, 1, 30, 59)), at(1, 1, 31, 0));
        assert_eq!(schedule.next_run_after(at(1, 1, 31, 0)), at(1, 5, 31, 0));
        assert_eq!(schedule.next_run_after(at(1, 22, 0, 0)), at(2, 1, 31, 0));
    }

    #[test]
    fn schedule_validation() {
        assert!(Schedule::default().validate().is_ok());
        let bad = Schedule {
            interval_hours: 5,
            offset_minutes: 0,
        };
        assert_eq!(bad.validate(), Err(ScheduleError::Interval(5)));
        let late = Schedule {
            interval_hours: 4,
            offset_minutes: 240,
        };
        assert!(matches!(
            late.validate(),
            Err(ScheduleError::Offset { offset: 240, .. })
        ));
    }

    #[test]
    fn single_flight_skips_overlap() {
        let guard = Arc::new(SingleFlight::new());
        let inner = Arc::clone(&guard);
        let outcome = guard.run(|| inner.run(|| 1));
        assert_eq!(outcome, Some(None));
        assert_eq!(guard.run(|| 2), Some(2));
    }

    #[test]
    fn single_flight_across_threads() {
        let guard = Arc::new(SingleFlight::new());
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let holder = {
            let guard = Arc::clone(&guard);
            std::thread::spawn(move || {
                guard.run(|| {
                    entered_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                })
            })
        };

        entered_rx.recv().unwrap();
        assert!(guard.run(|| ()).is_none());
        release_tx.send(()).unwrap();
        assert!(holder.join().unwrap().is_some());
        assert!(guard.run(|| ()).is_some());
    }
}
