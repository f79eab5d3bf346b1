//! # Storage Layer
//!
//! Persistence for blogpub. Everything lives in plain files inside the site
//! checkout so the published blog can be served statically and versioned
//! with git.
//!
//! ## Storage Formats
//!
//! | Data | Format | Default location |
//! |------|--------|------------------|
//! | Drafts | Bundle dir or `.txt` | `blog/blog-posts/.tank/` |
//! | Published posts | `index.html` + assets | `blog/blog-posts/.posted/{partition}/{slug}/` |
//! | Partition manifest | JSON | `blog/blog-posts/.posted/{partition}/manifest.json` |
//! | Root manifest | JSON (regenerated) | `blog/blog-posts/.posted/manifest.json` |
//! | Publish state | JSON | `blog/blog-posts/.state.json` |
//! | Commit journal | JSON | `blog/blog-posts/.pending.json` |
//! | Config | TOML | `blogpub.toml` |
//!
//! ## Crash Safety
//!
//! - All JSON documents and rendered pages are written atomically
//!   (temp file + rename)
//! - The state file is written last, after every other effect of a run
//! - [`CommitJournal`] records drafts whose removal is pending so an
//!   interrupted run can be finished instead of repeated
//!
//! There is no locking: a single publisher process is assumed.
//!
//! ## Key Types
//!
//! - [`Site`] - Entry point resolving the configured layout
//! - [`Tank`] - Lists, reads, creates and removes drafts
//! - [`ManifestStore`] - Partition manifests and the root aggregate
//! - [`StateStore`] - Last published timestamp
//! - [`Config`] - Site configuration

mod atomic;
mod config;
mod journal;
mod manifest;
mod site;
mod state;
mod tank;

pub use atomic::{write_atomic, write_json_atomic};
pub use config::{Config, ConfigError, PathsConfig, ScheduleConfig, SiteConfig, CONFIG_FILE};
pub use journal::{CommitJournal, PendingCommit};
pub use manifest::{ManifestError, ManifestStore, MANIFEST_FILE};
pub use site::Site;
pub use state::{StateError, StateStore};
pub use tank::{ReadError, Tank, CONTENT_FILE, INDEX_FILE};
