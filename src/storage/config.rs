//! Configuration handling for blogpub
//!
//! Configuration is stored in `blogpub.toml` at the site root. Every key is
//! optional; a missing file means the stock layout:
//!
//! ```toml
//! [schedule]
//! interval_hours = 12
//! backfill_start = "2024-12-01T00:00:00Z"
//!
//! [paths]
//! tank_dir = "blog/blog-posts/.tank"
//! posted_dir = "blog/blog-posts/.posted"
//! state_file = "blog/blog-posts/.state.json"
//! journal_file = "blog/blog-posts/.pending.json"
//! template = "blog/templates/post.html"
//!
//! [site]
//! url_prefix = "/blog/blog-posts/.posted"
//! ```
//!
//! Relative paths resolve against the site root.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::domain::{parse_timestamp, Schedule};

/// File name of the site configuration
pub const CONFIG_FILE: &str = "blogpub.toml";

/// Longest accepted slot interval: one leap year
pub const MAX_INTERVAL_HOURS: u32 = 24 * 366;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Publish cadence settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Hours between publish slots
    pub interval_hours: u32,

    /// First slot filled on a fresh site; a quoted RFC 3339 string or a
    /// native TOML datetime with an offset
    #[serde(deserialize_with = "timestamp_or_datetime")]
    pub backfill_start: DateTime<Utc>,
}

fn timestamp_or_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match toml::Value::deserialize(deserializer)? {
        toml::Value::String(s) => s,
        toml::Value::Datetime(dt) => dt.to_string(),
        other => {
            return Err(D::Error::custom(format!(
                "expected an RFC 3339 timestamp, found {}",
                other.type_str()
            )))
        }
    };
    parse_timestamp(&text).map_err(|e| {
        D::Error::custom(format!("invalid timestamp '{}' (needs date, time and offset): {}", text, e))
    })
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_hours: 12,
            backfill_start: Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap(),
        }
    }
}

/// Filesystem layout, relative to the site root unless absolute
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Draft backlog
    pub tank_dir: PathBuf,

    /// Published partitions and the root manifest
    pub posted_dir: PathBuf,

    /// Last published timestamp
    pub state_file: PathBuf,

    /// Posts committed to a manifest whose draft is not yet removed
    pub journal_file: PathBuf,

    /// Optional page template with `{{TITLE}}`, `{{DATE}}`, `{{CONTENT}}`
    pub template: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let posts = PathBuf::from("blog").join("blog-posts");
        Self {
            tank_dir: posts.join(".tank"),
            posted_dir: posts.join(".posted"),
            state_file: posts.join(".state.json"),
            journal_file: posts.join(".pending.json"),
            template: PathBuf::from("blog").join("templates").join("post.html"),
        }
    }
}

/// Public URL settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    /// URL path under which partitions are served
    pub url_prefix: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url_prefix: "/blog/blog-posts/.posted".to_string(),
        }
    }
}

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub schedule: ScheduleConfig,
    pub paths: PathsConfig,
    pub site: SiteConfig,
}

impl Config {
    /// Loads `blogpub.toml` from the site root, or defaults if absent
    pub fn for_site(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Loads and validates a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        let hours = self.schedule.interval_hours;
        if hours == 0 || hours > MAX_INTERVAL_HOURS {
            return Err(ConfigError::Invalid(format!(
                "schedule.interval_hours must be between 1 and {}, got {}",
                MAX_INTERVAL_HOURS, hours
            )));
        }
        Ok(())
    }

    /// The publish schedule described by this configuration
    pub fn schedule(&self) -> Result<Schedule, ConfigError> {
        self.validate()?;
        let interval = Duration::hours(i64::from(self.schedule.interval_hours));
        Schedule::new(interval, self.schedule.backfill_start).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "schedule.backfill_start {} leaves no room for a slot before it",
                self.schedule.backfill_start
            ))
        })
    }

    /// Commented starter file written by `blogpub init`
    pub fn starter_toml() -> &'static str {
        r#"# blogpub configuration
# All keys are optional; the values below are the defaults.

[schedule]
# Hours between publish slots
interval_hours = 12
# First slot filled on a fresh site (no state file yet); RFC 3339 with an
# offset, quoted or as a bare TOML datetime
backfill_start = "2024-12-01T00:00:00Z"

[paths]
tank_dir = "blog/blog-posts/.tank"
posted_dir = "blog/blog-posts/.posted"
state_file = "blog/blog-posts/.state.json"
journal_file = "blog/blog-posts/.pending.json"
template = "blog/templates/post.html"

[site]
url_prefix = "/blog/blog-posts/.posted"
"#
    }
}
