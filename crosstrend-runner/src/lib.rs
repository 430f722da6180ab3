//! CrossTrend Runner: the scheduled alert pipeline around `crosstrend-core`.
//!
//! This crate provides:
//! - A JSONL history store of enriched rows
//! - Bar sources (CSV file, in-memory)
//! - Notifiers with message chunking (log, file, in-memory)
//! - The E001..E006 error-code taxonomy and reporter
//! - The incremental pipeline run and backfill
//! - Wall-clock scheduling with a single-flight guard

pub mod config;
pub mod error_codes;
pub mod notify;
pub mod pipeline;
pub mod schedule;
pub mod source;
pub mod store;

pub use config::{ConfigError, PipelineConfig};
pub use error_codes::{taxonomy, ErrorCode, ErrorReporter};
pub use notify::{
    chunk_message, FileNotifier, LogNotifier, MemoryNotifier, Notifier, NotifyError,
    MAX_MESSAGE_CHARS,
};
pub use pipeline::{merge_bars, BackfillSummary, Pipeline, PipelineError, RunSummary};
pub use schedule::{run_scheduled, Schedule, SingleFlight};
pub use source::{BarSource, CsvBarSource, MemorySource, SourceError};
pub use store::{HistoryStore, JsonlStore, MemoryStore, StoreError};
