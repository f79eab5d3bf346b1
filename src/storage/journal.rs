//! Commit journal
//!
//! Publishing a draft touches three things: the rendered page, the partition
//! manifest and the draft itself. Only the draft removal makes the step
//! non-repeatable, so before removing a draft the publisher records it here.
//! A run that dies between that record and the state update leaves the
//! journal behind; the next run finishes the removals and advances the state
//! past the recorded slots instead of publishing those drafts a second time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::atomic::write_json_atomic;
use crate::domain::Slug;

/// A post whose page and manifest entry are written but whose draft may
/// still be in the tank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingCommit {
    pub slug: Slug,
    pub draft: PathBuf,
    pub url: String,
    pub slot: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct JournalFile {
    #[serde(default)]
    pending: Vec<PendingCommit>,
}

/// Write-ahead list of committed posts
pub struct CommitJournal {
    path: PathBuf,
}

impl CommitJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads pending commits; a missing journal has none
    pub fn read(&self) -> Result<Vec<PendingCommit>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read journal: {}", self.path.display()))
            }
        };

        let file: JournalFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse journal: {}", self.path.display()))?;
        Ok(file.pending)
    }

    /// Appends a commit record
    pub fn record(&self, commit: PendingCommit) -> Result<()> {
        let mut pending = self.read()?;
        pending.retain(|p| p.url != commit.url);
        pending.push(commit);
        write_json_atomic(&self.path, &JournalFile { pending })
    }

    /// Removes the journal once its commits are reflected in the state file
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to clear journal: {}", self.path.display()))
            }
        }
    }
}
