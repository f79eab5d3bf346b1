//! Manifest storage
//!
//! Published posts live under the posted directory, one subdirectory per
//! partition:
//!
//! ```text
//! .posted/
//! ├── manifest.json                 # root manifest (regenerated every run)
//! ├── 2024-12-december/
//! │   ├── manifest.json             # partition manifest, oldest first
//! │   ├── first-post/index.html
//! │   └── second-post/index.html
//! └── 2025-01-january/
//!     └── ...
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::atomic::write_json_atomic;
use crate::domain::{Manifest, ManifestEntry, PartitionKey};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Manifest {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Store for partition manifests and the aggregated root manifest
pub struct ManifestStore {
    dir: PathBuf,
}

impl ManifestStore {
    /// Creates a store rooted at the posted directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory holding a partition's posts and manifest
    pub fn partition_dir(&self, partition: &PartitionKey) -> PathBuf {
        self.dir.join(partition.as_str())
    }

    pub fn root_manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Reads a manifest file strictly; a missing file is an empty manifest
    pub fn read_file(path: &Path) -> Result<Manifest, ManifestError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Manifest::default()),
            Err(source) => {
                return Err(ManifestError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|e| ManifestError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Reads a manifest, treating a corrupt file as empty
    ///
    /// The next write replaces the corrupt file, so its entries are lost;
    /// the warning is the only trace of that.
    fn read_lenient(path: &Path) -> Result<Manifest, ManifestError> {
        match Self::read_file(path) {
            Err(ManifestError::Corrupt { path, reason }) => {
                tracing::warn!(
                    path = %path.display(),
                    %reason,
                    "manifest is corrupt; treating it as empty"
                );
                Ok(Manifest::default())
            }
            other => other,
        }
    }

    /// Reads a partition manifest (empty if missing or corrupt)
    pub fn read_partition(&self, partition: &PartitionKey) -> Result<Manifest, ManifestError> {
        Self::read_lenient(&self.partition_dir(partition).join(MANIFEST_FILE))
    }

    /// Adds or replaces an entry in a partition manifest
    pub fn upsert(&self, partition: &PartitionKey, entry: ManifestEntry) -> Result<Manifest> {
        let mut manifest = self.read_partition(partition)?;
        manifest.upsert(entry);

        let path = self.partition_dir(partition).join(MANIFEST_FILE);
        write_json_atomic(&path, &manifest)
            .with_context(|| format!("Failed to write partition manifest for {}", partition))?;

        Ok(manifest)
    }

    /// Partition directories in name order
    pub fn partition_dirs(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read directory: {}", self.dir.display()))?
        {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }

        dirs.sort();
        Ok(dirs)
    }

    /// Merges every partition manifest into one list, newest first
    pub fn aggregate(&self) -> Result<Manifest> {
        let mut manifests = Vec::new();
        for dir in self.partition_dirs()? {
            manifests.push(Self::read_lenient(&dir.join(MANIFEST_FILE))?);
        }
        Ok(Manifest::aggregate(manifests))
    }

    /// Regenerates the root manifest from the partition manifests
    pub fn rebuild_root(&self) -> Result<Manifest> {
        let root = self.aggregate()?;
        write_json_atomic(&self.root_manifest_path(), &root)
            .context("Failed to write root manifest")?;
        Ok(root)
    }

    /// Reads the root manifest as last written
    pub fn read_root(&self) -> Result<Manifest, ManifestError> {
        Self::read_lenient(&self.root_manifest_path())
    }
}
