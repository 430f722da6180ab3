//! Outbound notifications.
//!
//! Messages longer than the channel limit are split into consecutive chunks
//! of at most `max_chars` characters before delivery.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::info;

/// Longest single message most chat channels accept.
pub const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification I/O: {0}")]
    Io(#[from] io::Error),

    #[error("notification rejected: {0}")]
    Rejected(String),
}

pub trait Notifier: Send + Sync {
    /// Deliver one chunk that already fits the limit.
    fn deliver(&self, chunk: &str) -> Result<(), NotifyError>;

    fn max_chars(&self) -> usize {
        MAX_MESSAGE_CHARS
    }

    /// Deliver `text`, split into chunks when it is too long.
    fn send(&self, text: &str) -> Result<(), NotifyError> {
        for chunk in chunk_message(text, self.max_chars()) {
            self.deliver(&chunk)?;
        }
        Ok(())
    }
}

/// Split on character boundaries into pieces of at most `max_chars` chars.
/// An empty message is a single empty chunk.
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Writes notifications to the log.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    max_chars: usize,
}

impl LogNotifier {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new(MAX_MESSAGE_CHARS)
    }
}

impl Notifier for LogNotifier {
    fn deliver(&self, chunk: &str) -> Result<(), NotifyError> {
        info!(target: "crosstrend::notify", "{chunk}");
        Ok(())
    }

    fn max_chars(&self) -> usize {
        self.max_chars
    }
}

/// Appends one line per chunk to a file.
#[derive(Debug, Clone)]
pub struct FileNotifier {
    path: PathBuf,
    max_chars: usize,
}

impl FileNotifier {
    pub fn new(path: impl Into<PathBuf>, max_chars: usize) -> Self {
        Self {
            path: path.into(),
            max_chars,
        }
    }
}

impl Notifier for FileNotifier {
    fn deliver(&self, chunk: &str) -> Result<(), NotifyError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{chunk}")?;
        file.flush()?;
        Ok(())
    }

    fn max_chars(&self) -> usize {
        self.max_chars
    }
}

/// Records delivered chunks; can be told to fail. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    sent: Arc<Mutex<Vec<String>>>,
    failing: bool,
    max_chars: Option<usize>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every delivery.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_max_chars(max_chars: usize) -> Self {
        Self {
            max_chars: Some(max_chars),
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.sent.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn sent(&self) -> Vec<String> {
        self.lock().clone()
    }
}

impl Notifier for MemoryNotifier {
    fn deliver(&self, chunk: &str) -> Result<(), NotifyError> {
        if self.failing {
            return Err(NotifyError::Rejected("notifier configured to fail".into()));
        }
        self.lock().push(chunk.to_string());
        Ok(())
    }

    fn max_chars(&self) -> usize {
        self.max_chars.unwrap_or(MAX_MESSAGE_CHARS)
    }
}
