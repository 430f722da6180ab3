//! History store: enriched rows persisted between runs.
//!
//! `JsonlStore` keeps one `StoredRecord` per line, appended in timestamp
//! order. Each line is an independent JSON object, so a partial write only
//! ever loses the last line. `MemoryStore` backs tests.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crosstrend_core::schema::{SchemaError, StoredRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O on '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("cannot encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("stored record has a bad timestamp: {0}")]
    Record(#[from] SchemaError),

    #[error("append out of order: {appended} is not after {last}")]
    OutOfOrder {
        last: DateTime<Utc>,
        appended: DateTime<Utc>,
    },
}

/// Persistence for enriched rows.
pub trait HistoryStore: Send + Sync {
    /// Timestamp of the newest stored record.
    fn last_processed(&self) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// The newest `n` records, oldest first.
    fn recent(&self, n: usize) -> Result<Vec<StoredRecord>, StoreError>;

    /// Append records newer than everything already stored.
    fn append(&self, records: &[StoredRecord]) -> Result<(), StoreError>;

    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// Reject a batch that is unordered or does not start after `last`.
fn check_append_order(
    last: Option<DateTime<Utc>>,
    records: &[StoredRecord],
) -> Result<(), StoreError> {
    let mut prev = last;
    for record in records {
        let ts = record.parsed_timestamp()?;
        if let Some(last) = prev {
            if ts <= last {
                return Err(StoreError::OutOfOrder { last, appended: ts });
            }
        }
        prev = Some(ts);
    }
    Ok(())
}

/// JSONL file store.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Every readable record, in file order. Malformed lines are skipped.
    pub fn read_all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_err(e)),
        };

        let mut records = Vec::new();
        for (number, line) in io::BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.io_err(e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = number + 1,
                    error = %e,
                    "skipping malformed store line"
                ),
            }
        }
        Ok(records)
    }
}

impl HistoryStore for JsonlStore {
    fn last_processed(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        match self.read_all()?.last() {
            Some(record) => Ok(Some(record.parsed_timestamp()?)),
            None => Ok(None),
        }
    }

    fn recent(&self, n: usize) -> Result<Vec<StoredRecord>, StoreError> {
        let mut records = self.read_all()?;
        let skip = records.len().saturating_sub(n);
        Ok(records.split_off(skip))
    }

    fn append(&self, records: &[StoredRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        check_append_order(self.last_processed()?, records)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;

        let mut buf = String::new();
        // Close off a torn last line so the first new record starts fresh.
        if ends_mid_line(&mut file).map_err(|e| self.io_err(e))? {
            warn!(path = %self.path.display(), "store ends mid-line; terminating it");
            buf.push('\n');
        }
        for record in records {
            buf.push_str(&serde_json::to_string(record)?);
            buf.push('\n');
        }
        file.write_all(buf.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| self.io_err(e))?;

        debug!(path = %self.path.display(), appended = records.len(), "store append");
        Ok(())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read_all()?.len())
    }
}

/// True when the file is non-empty and its last byte is not a newline.
fn ends_mid_line(file: &mut fs::File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// In-memory store. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<StoredRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<StoredRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StoredRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Vec<StoredRecord> {
        self.lock().clone()
    }
}

impl HistoryStore for MemoryStore {
    fn last_processed(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        match self.lock().last() {
            Some(record) => Ok(Some(record.parsed_timestamp()?)),
            None => Ok(None),
        }
    }

    fn recent(&self, n: usize) -> Result<Vec<StoredRecord>, StoreError> {
        let records = self.lock();
        let skip = records.len().saturating_sub(n);
        Ok(records[skip..].to_vec())
    }

    fn append(&self, records: &[StoredRecord]) -> Result<(), StoreError> {
        let mut stored = self.lock();
        let last = match stored.last() {
            Some(record) => Some(record.parsed_timestamp()?),
            None => None,
        };
        check_append_order(last, records)?;
        stored.extend_from_slice(records);
        Ok(())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock().len())
    }
}
