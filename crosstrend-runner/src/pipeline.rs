//! One pass of the alert pipeline.
//!
//! 1. Read the last processed timestamp and the recent stored history
//! 2. Fetch completed bars newer than the last processed one
//! 3. Merge, then require enough history for the indicator windows
//! 4. Enrich, detect from the last processed bar, notify new events
//! 5. Append the newly enriched rows to the store
//!
//! Every failure is reported with its error code before it is returned.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, PipelineConfig};
use crate::error_codes::{ErrorCode, ErrorReporter};
use crate::notify::{FileNotifier, LogNotifier, Notifier};
use crate::source::{BarSource, CsvBarSource, SourceError};
use crate::store::{HistoryStore, JsonlStore, StoreError};
use crosstrend_core::domain::{Bar, SignalEvent};
use crosstrend_core::engine::IndicatorEngine;
use crosstrend_core::error::CoreError;
use crosstrend_core::fingerprint::{hash_rows, SeriesHash};
use crosstrend_core::schema::{SchemaError, StoredRecord};
use crosstrend_core::signals::SignalDetector;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("history store is empty; seed it with a backfill first")]
    EmptyStore,

    #[error("insufficient history: {available} rows after merge, {required} required")]
    InsufficientHistory { required: usize, available: usize },

    #[error("backfill refused: store already holds {0} records")]
    StoreNotEmpty(usize),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("stored history unreadable: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PipelineError::EmptyStore | PipelineError::InsufficientHistory { .. } => ErrorCode::E001,
            PipelineError::Core(err) => match err {
                CoreError::InsufficientHistory { .. } | CoreError::InsufficientLookback { .. } => {
                    ErrorCode::E001
                }
                CoreError::MalformedInput { .. } | CoreError::ReferenceNotFound { .. } => {
                    ErrorCode::E006
                }
            },
            PipelineError::Schema(_) => ErrorCode::E006,
            PipelineError::Store(_) | PipelineError::StoreNotEmpty(_) => ErrorCode::E002,
            PipelineError::Source(_) => ErrorCode::E004,
            PipelineError::Config(_) => ErrorCode::E005,
        }
    }
}

/// Outcome of one `run_once`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Stored history used as the reference point; `None` when the run was a no-op.
    pub reference: Option<DateTime<Utc>>,
    /// Rows appended to the store.
    pub new_rows: usize,
    /// Events notified this run.
    pub events: Vec<SignalEvent>,
    /// Events whose notification failed (reported as E003).
    pub notify_failures: usize,
    /// Fingerprint of the enriched series the events came from.
    pub fingerprint: Option<SeriesHash>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackfillSummary {
    pub rows: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
    pub fingerprint: SeriesHash,
}

pub struct Pipeline {
    config: PipelineConfig,
    engine: IndicatorEngine,
    detector: SignalDetector,
    store: Box<dyn HistoryStore>,
    source: Box<dyn BarSource>,
    notifier: Arc<dyn Notifier>,
    reporter: ErrorReporter,
}

impl Pipeline {
    /// Rejects an invalid configuration before any run can start.
    pub fn new(
        config: PipelineConfig,
        store: Box<dyn HistoryStore>,
        source: Box<dyn BarSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            engine: IndicatorEngine::new(config.engine.clone())?,
            detector: SignalDetector::new(config.detector.clone()),
            reporter: ErrorReporter::new(Arc::clone(&notifier)),
            config,
            store,
            source,
            notifier,
        })
    }

    /// File-backed pipeline: JSONL store, CSV bars, file or log notifications.
    pub fn from_config(config: PipelineConfig) -> Result<Self, ConfigError> {
        let notifier: Arc<dyn Notifier> = match config.notify_file() {
            Some(path) => Arc::new(FileNotifier::new(path, config.max_message_chars)),
            None => Arc::new(LogNotifier::new(config.max_message_chars)),
        };
        let store = Box::new(JsonlStore::new(&config.store_path));
        let source = Box::new(CsvBarSource::new(&config.bars_path));
        Self::new(config, store, source, notifier)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// One incremental pass at wall-clock time `now`.
    pub fn run_once(&self, now: DateTime<Utc>) -> Result<RunSummary, PipelineError> {
        self.try_run_once(now).map_err(|err| self.report(err))
    }

    /// Seed an empty store with the source's whole completed history.
    pub fn backfill(&self, now: DateTime<Utc>) -> Result<BackfillSummary, PipelineError> {
        self.try_backfill(now).map_err(|err| self.report(err))
    }

    fn report(&self, err: PipelineError) -> PipelineError {
        self.reporter.report(err.code(), &err.to_string());
        err
    }

    fn try_run_once(&self, now: DateTime<Utc>) -> Result<RunSummary, PipelineError> {
        let reference = self
            .store
            .last_processed()?
            .ok_or(PipelineError::EmptyStore)?;

        let stored = self.store.recent(self.config.history_rows)?;
        let stored_bars = stored
            .iter()
            .map(StoredRecord::to_bar)
            .collect::<Result<Vec<_>, _>>()?;

        let fresh = self.source.fetch_since(Some(reference), now)?;
        info!(
            reference = %reference,
            stored = stored_bars.len(),
            fetched = fresh.len(),
            source = self.source.name(),
            "pipeline run started"
        );
        if fresh.is_empty() {
            info!("no completed bars since last run");
            return Ok(RunSummary {
                reference: Some(reference),
                new_rows: 0,
                events: Vec::new(),
                notify_failures: 0,
                fingerprint: None,
            });
        }

        let bars = merge_bars(stored_bars, fresh);
        if bars.len() < self.config.min_history_rows {
            return Err(PipelineError::InsufficientHistory {
                required: self.config.min_history_rows,
                available: bars.len(),
            });
        }

        let rows = self.engine.enrich(&bars)?;
        let fingerprint = hash_rows(&rows);
        debug!(rows = rows.len(), fingerprint = fingerprint.short(), "series enriched");

        // Events on the reference bar went out with the previous run.
        let events: Vec<SignalEvent> = self
            .detector
            .scan(&rows, reference)?
            .into_iter()
            .filter(|event| event.timestamp > reference + bar_length())
            .collect();

        let mut notify_failures = 0;
        for event in &events {
            info!(kind = %event.kind, at = %event.timestamp, "signal");
            if let Err(e) = self.notifier.send(&event.message) {
                notify_failures += 1;
                self.reporter.report(
                    ErrorCode::E003,
                    &format!("failed to send '{}': {e}", event.message),
                );
            }
        }

        let new_records: Vec<StoredRecord> = rows
            .iter()
            .filter(|row| row.timestamp() > reference)
            .map(StoredRecord::from)
            .collect();
        self.store.append(&new_records)?;

        info!(
            new_rows = new_records.len(),
            events = events.len(),
            "pipeline run complete"
        );
        Ok(RunSummary {
            reference: Some(reference),
            new_rows: new_records.len(),
            events,
            notify_failures,
            fingerprint: Some(fingerprint),
        })
    }

    fn try_backfill(&self, now: DateTime<Utc>) -> Result<BackfillSummary, PipelineError> {
        let existing = self.store.len()?;
        if existing > 0 {
            return Err(PipelineError::StoreNotEmpty(existing));
        }

        let bars = self.source.fetch_since(None, now)?;
        let rows = self.engine.enrich(&bars)?;
        let records: Vec<StoredRecord> = rows.iter().map(StoredRecord::from).collect();
        self.store.append(&records)?;

        info!(rows = rows.len(), "store backfilled");
        Ok(BackfillSummary {
            rows: rows.len(),
            first: rows.first().map(|r| r.timestamp()),
            last: rows.last().map(|r| r.timestamp()),
            fingerprint: hash_rows(&rows),
        })
    }
}

fn bar_length() -> chrono::Duration {
    chrono::Duration::hours(crosstrend_core::domain::BAR_INTERVAL_HOURS)
}

/// Stored bars first; a fetched bar never replaces a stored one with the
/// same timestamp. Result is sorted by timestamp.
pub fn merge_bars(stored: Vec<Bar>, fetched: Vec<Bar>) -> Vec<Bar> {
    let mut by_time: BTreeMap<DateTime<Utc>, Bar> = BTreeMap::new();
    for bar in stored.into_iter().chain(fetched) {
        by_time.entry(bar.timestamp).or_insert(bar);
    }
    by_time.into_values().collect()
}
