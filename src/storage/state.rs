//! Publish state
//!
//! A single JSON record, `{"last_published_at": "2024-12-01T00:00:00Z"}`,
//! shared between runs. It is only advanced after a run's posts are written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::atomic::write_json_atomic;
use crate::domain::{format_timestamp, parse_timestamp};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to read state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("State file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_published_at: Option<String>,
}

/// Store for the last published timestamp
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored timestamp; `Ok(None)` if there is no state yet
    pub fn read(&self) -> Result<Option<DateTime<Utc>>, StateError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StateError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let corrupt = |reason: String| StateError::Corrupt {
            path: self.path.clone(),
            reason,
        };

        let record: StateRecord =
            serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;

        match record.last_published_at.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(ts) => parse_timestamp(ts)
                .map(Some)
                .map_err(|e| corrupt(format!("bad timestamp '{}': {}", ts, e))),
        }
    }

    /// Reads the stored timestamp, treating a corrupt file as absent
    ///
    /// Falling back to `None` re-seeds the schedule from the backfill start.
    pub fn load(&self) -> Result<Option<DateTime<Utc>>, StateError> {
        match self.read() {
            Err(StateError::Corrupt { path, reason }) => {
                tracing::warn!(
                    path = %path.display(),
                    %reason,
                    "publish state is corrupt; treating it as absent"
                );
                Ok(None)
            }
            other => other,
        }
    }

    /// Atomically records a new last published timestamp
    pub fn save(&self, last_published_at: DateTime<Utc>) -> Result<()> {
        let record = StateRecord {
            last_published_at: Some(format_timestamp(last_published_at)),
        };
        write_json_atomic(&self.path, &record)
    }
}
