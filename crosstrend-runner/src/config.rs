//! Pipeline configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! history_rows = 450
//! min_history_rows = 450
//! store_path = "data/btc_4h.jsonl"
//! bars_path = "data/bars.csv"
//! notify_path = ""            # empty: notifications go to the log
//! max_message_chars = 4096
//!
//! [engine]
//! dema_length = 200
//!
//! [detector]
//! lead_rows = 4
//!
//! [schedule]
//! interval_hours = 4
//! offset_minutes = 91
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notify::MAX_MESSAGE_CHARS;
use crate::schedule::{Schedule, ScheduleError};
use crosstrend_core::engine::{EngineConfig, EngineConfigError};
use crosstrend_core::signals::{DetectorConfig, DetectorConfigError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid engine parameters: {0}")]
    Engine(#[from] EngineConfigError),

    #[error("invalid detector parameters: {0}")]
    Detector(#[from] DetectorConfigError),

    #[error("invalid schedule: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("min_history_rows ({min_history_rows}) is below the engine's largest window ({required})")]
    HistoryBelowWindow {
        min_history_rows: usize,
        required: usize,
    },

    #[error("history_rows ({history_rows}) must be at least {required}")]
    HistoryBelowLead {
        history_rows: usize,
        required: usize,
    },

    #[error("max_message_chars must be > 0")]
    ZeroMessageChars,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stored rows read back before each run.
    pub history_rows: usize,
    /// Merged rows required before the engine runs.
    pub min_history_rows: usize,
    pub store_path: PathBuf,
    pub bars_path: PathBuf,
    /// Append notifications to this file. Empty: log them instead.
    pub notify_path: PathBuf,
    pub max_message_chars: usize,
    pub engine: EngineConfig,
    pub detector: DetectorConfig,
    pub schedule: Schedule,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            history_rows: 450,
            min_history_rows: 450,
            store_path: PathBuf::from("data/btc_4h.jsonl"),
            bars_path: PathBuf::from("data/bars.csv"),
            notify_path: PathBuf::new(),
            max_message_chars: MAX_MESSAGE_CHARS,
            engine: EngineConfig::default(),
            detector: DetectorConfig::default(),
            schedule: Schedule::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.detector.validate()?;
        self.schedule.validate()?;

        let required = self.engine.required_history();
        if self.min_history_rows < required {
            return Err(ConfigError::HistoryBelowWindow {
                min_history_rows: self.min_history_rows,
                required,
            });
        }
        if self.history_rows < self.detector.lead_rows + 1 {
            return Err(ConfigError::HistoryBelowLead {
                history_rows: self.history_rows,
                required: self.detector.lead_rows + 1,
            });
        }
        if self.max_message_chars == 0 {
            return Err(ConfigError::ZeroMessageChars);
        }
        Ok(())
    }

    /// `None` when notifications should go to the log.
    pub fn notify_file(&self) -> Option<&Path> {
        (!self.notify_path.as_os_str().is_empty()).then_some(self.notify_path.as_path())
    }
}
