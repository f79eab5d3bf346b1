//! Site management
//!
//! Resolves the configured layout against a site root and hands out stores.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::config::CONFIG_FILE;
use super::{CommitJournal, Config, ManifestStore, StateStore, Tank};
use crate::domain::Template;

/// A website checkout containing a blog
pub struct Site {
    root: PathBuf,
    config: Config,
}

impl Site {
    /// Opens a site, reading `blogpub.toml` from the root if present
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            anyhow::bail!("Site root is not a directory: {}", root.display());
        }
        let config = Config::for_site(&root)?;
        Ok(Self { root, config })
    }

    /// Opens a site with an explicit configuration file
    pub fn open_with_config(root: impl Into<PathBuf>, config_path: &Path) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            anyhow::bail!("Site root is not a directory: {}", root.display());
        }
        let config = Config::load(config_path)?;
        Ok(Self { root, config })
    }

    /// Opens a site with an in-memory configuration
    pub fn with_config(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Creates the tank and posted directories and a starter config
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create site root: {}", root.display()))?;

        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            fs::write(&config_path, Config::starter_toml())
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let site = Self::open(root)?;
        for dir in [site.tank_dir(), site.posted_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        Ok(site)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolves a configured path against the site root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn tank_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.tank_dir)
    }

    pub fn posted_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.posted_dir)
    }

    pub fn tank(&self) -> Tank {
        Tank::new(self.tank_dir())
    }

    pub fn manifests(&self) -> ManifestStore {
        ManifestStore::new(self.posted_dir())
    }

    pub fn state(&self) -> StateStore {
        StateStore::new(self.resolve(&self.config.paths.state_file))
    }

    pub fn journal(&self) -> CommitJournal {
        CommitJournal::new(self.resolve(&self.config.paths.journal_file))
    }

    /// Loads the configured page template, falling back to the built-in one
    ///
    /// A template file that exists but lacks a placeholder is ignored with a
    /// warning rather than failing the run.
    pub fn template(&self) -> Result<Template> {
        let path = self.resolve(&self.config.paths.template);
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Template::builtin()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read template: {}", path.display()))
            }
        };

        match Template::parse(source) {
            Ok(template) => Ok(template),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring invalid template; using the built-in layout"
                );
                Ok(Template::builtin())
            }
        }
    }
}
