//! Domain types for CrossTrend

pub mod bar;
pub mod event;
pub mod row;

pub use bar::{Bar, BarError, BAR_INTERVAL_HOURS};
pub use event::{SignalEvent, SignalKind, TIMESTAMP_FORMAT};
pub use row::{Direction, IndicatorRow, TrendSignal};
