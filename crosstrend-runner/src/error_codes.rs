//! Operator-facing error codes and the reporter that publishes them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::notify::Notifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    E001,
    E002,
    E003,
    E004,
    E005,
    E006,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 6] = [
        ErrorCode::E001,
        ErrorCode::E002,
        ErrorCode::E003,
        ErrorCode::E004,
        ErrorCode::E005,
        ErrorCode::E006,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ErrorCode::E001 => "Insufficient Data",
            ErrorCode::E002 => "Database Error",
            ErrorCode::E003 => "Notification Failure",
            ErrorCode::E004 => "Data Fetch Error",
            ErrorCode::E005 => "Unexpected Error",
            ErrorCode::E006 => "Calculation Error",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::E001 => "Not enough history for the indicator windows or the detector lead.",
            ErrorCode::E002 => "Reading from or writing to the history store failed.",
            ErrorCode::E003 => "A notification could not be delivered.",
            ErrorCode::E004 => "New bars could not be fetched.",
            ErrorCode::E005 => "Anything not covered by the other codes.",
            ErrorCode::E006 => "Malformed data or a failure while computing indicators or signals.",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line per code, for help output.
pub fn taxonomy() -> String {
    ErrorCode::ALL
        .iter()
        .map(|code| format!("{code}: '{}' - {}", code.title(), code.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Logs a coded error and tells the operator channel about it.
#[derive(Clone)]
pub struct ErrorReporter {
    notifier: Arc<dyn Notifier>,
}

impl ErrorReporter {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn report(&self, code: ErrorCode, message: &str) {
        error!(code = %code, "ERROR CODE: {code} | {message}");
        if let Err(e) = self.notifier.send(&format!("Error occurred: {code}")) {
            error!(
                code = %ErrorCode::E003,
                "ERROR CODE: {} | failed to send error notification: {e}",
                ErrorCode::E003
            );
        }
    }
}

impl std::fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter").finish_non_exhaustive()
    }
}
