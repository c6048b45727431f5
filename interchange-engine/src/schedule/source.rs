//! Schedule record sources.
//!
//! The graph builder pulls records in batches through the
//! `ScheduleSource` trait, the way a database cursor hands out documents.
//! A record that cannot be decoded is delivered as an `Err` item so the
//! builder can skip it without abandoning the batch.

use std::collections::VecDeque;
use std::future::Future;
use std::path::{Path, PathBuf};

use super::types::ScheduleRecord;

/// A record that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("undecodable record at position {position}: {message}")]
pub struct RecordError {
    /// Position of the record in the source (line number for files).
    pub position: usize,
    pub message: String,
}

/// One item from a source batch.
pub type RecordResult = Result<ScheduleRecord, RecordError>;

/// Errors reading from a schedule source.
///
/// These are treated as transient by the graph builder and retried.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The underlying store reported a failure
    #[error("source read failed: {0}")]
    Read(String),

    /// File contents are not records at all
    #[error("invalid source format: {0}")]
    Format(String),
}

/// A cursor over schedule records.
///
/// This abstraction allows the builder to be tested with in-memory data
/// and fed from a database cursor in production.
pub trait ScheduleSource: Send {
    /// Fetch up to `max` records.
    ///
    /// Returns `Ok(None)` once the source is exhausted. An `Err` means the
    /// read itself failed; calling again retries the same position.
    fn next_batch(
        &mut self,
        max: usize,
    ) -> impl Future<Output = Result<Option<Vec<RecordResult>>, SourceError>> + Send;
}

/// Source over records already in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: VecDeque<ScheduleRecord>,
}

impl InMemorySource {
    pub fn new(records: Vec<ScheduleRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Records not yet handed out.
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl ScheduleSource for InMemorySource {
    async fn next_batch(
        &mut self,
        max: usize,
    ) -> Result<Option<Vec<RecordResult>>, SourceError> {
        if self.records.is_empty() {
            return Ok(None);
        }
        let take = max.max(1).min(self.records.len());
        Ok(Some(self.records.drain(..take).map(Ok).collect()))
    }
}

/// Source over a schedule file.
///
/// Accepts either JSON Lines (one service document per line) or a single
/// JSON array of service documents.
#[derive(Debug)]
pub struct JsonFileSource {
    path: PathBuf,
    /// (position, raw document)
    pending: VecDeque<(usize, String)>,
}

impl JsonFileSource {
    /// Read the file and split it into documents.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let contents = std::fs::read_to_string(&path).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;

        let pending = if contents.trim_start().starts_with('[') {
            let values: Vec<serde_json::Value> = serde_json::from_str(&contents)
                .map_err(|e| SourceError::Format(format!("{}: {}", path.display(), e)))?;
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i, v.to_string()))
                .collect()
        } else {
            contents
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(i, line)| (i + 1, line.to_string()))
                .collect()
        };

        Ok(Self { path, pending })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl ScheduleSource for JsonFileSource {
    async fn next_batch(
        &mut self,
        max: usize,
    ) -> Result<Option<Vec<RecordResult>>, SourceError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let take = max.max(1).min(self.pending.len());
        let batch = self
            .pending
            .drain(..take)
            .map(|(position, raw)| {
                serde_json::from_str::<ScheduleRecord>(&raw).map_err(|e| RecordError {
                    position,
                    message: e.to_string(),
                })
            })
            .collect();
        Ok(Some(batch))
    }
}
