// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSON-lines journal of delivered events
//!
//! The journal belongs to the subscriber that registers it; the router keeps
//! no event history of its own.

use super::{DeliveryError, DeliveryTarget};
use crate::event::{Event, EventType, Priority};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use thiserror::Error;

/// Journal IO errors
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt journal record at line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),
}

/// One journaled delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRecord {
    /// Monotonic sequence number, starting at 1 for a new file
    pub sequence: u64,
    /// Milliseconds since the journal was opened
    pub timestamp_ms: u64,
    pub event_id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub payload: serde_json::Value,
}

struct JournalState {
    file: File,
    sequence: u64,
}

impl JournalState {
    fn append(
        &mut self,
        opened_at: Instant,
        event: &Event,
    ) -> Result<JournalRecord, JournalError> {
        let record = JournalRecord {
            sequence: self.sequence + 1,
            timestamp_ms: opened_at.elapsed().as_millis() as u64,
            event_id: event.id().to_string(),
            event_type: event.event_type(),
            priority: event.priority(),
            correlation_id: event.correlation_id().map(str::to_string),
            payload: event.payload().clone(),
        };

        let json = serde_json::to_string(&record).map_err(JournalError::Encode)?;
        writeln!(self.file, "{}", json)?;
        self.file.flush()?;
        self.sequence = record.sequence;

        Ok(record)
    }
}

/// Target that appends every delivered event to a file
///
/// Deliveries write on tokio's blocking pool, so a slow disk never holds a
/// runtime worker thread.
pub struct JournalTarget {
    path: PathBuf,
    opened_at: Instant,
    state: Arc<Mutex<JournalState>>,
}

impl JournalTarget {
    /// Open or create a journal; sequence numbering continues after
    /// existing records
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let sequence = if path.exists() {
            BufReader::new(File::open(&path)?)
                .lines()
                .filter(|line| line.as_ref().map_or(true, |l| !l.is_empty()))
                .count() as u64
        } else {
            0
        };
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            opened_at: Instant::now(),
            state: Arc::new(Mutex::new(JournalState { file, sequence })),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event on the calling thread, returning the written record
    pub fn append(&self, event: &Event) -> Result<JournalRecord, JournalError> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .append(self.opened_at, event)
    }

    /// Read every record in the file
    pub fn read_all(&self) -> Result<Vec<JournalRecord>, JournalError> {
        Self::read_path(&self.path)
    }

    /// Records with a sequence number greater than `sequence`
    pub fn after(&self, sequence: u64) -> Result<Vec<JournalRecord>, JournalError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.sequence > sequence)
            .collect())
    }

    pub fn current_sequence(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .sequence
    }

    /// Read a journal file without opening it for writing
    pub fn read_path(path: &Path) -> Result<Vec<JournalRecord>, JournalError> {
        if !path.exists() {
            return Ok(vec![]);
        }

        let mut records = Vec::new();
        for (index, line) in BufReader::new(File::open(path)?).lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|source| JournalError::Corrupt {
                line: index + 1,
                source,
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

#[async_trait]
impl DeliveryTarget for JournalTarget {
    async fn deliver(&self, event: Arc<Event>) -> Result<(), DeliveryError> {
        let state = Arc::clone(&self.state);
        let opened_at = self.opened_at;
        let written = tokio::task::spawn_blocking(move || {
            state
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .append(opened_at, &event)
        })
        .await
        .map_err(|e| DeliveryError::Rejected(format!("journal writer failed: {}", e)))?;

        written
            .map(|_| ())
            .map_err(|e| DeliveryError::Rejected(e.to_string()))
    }

    fn describe(&self) -> String {
        format!("journal:{}", self.path.display())
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
