//! Blogpub - scheduled publishing for a backlog of blog drafts
//!
//! Drafts wait in a tank directory and are released one per fixed interval
//! into monthly partitions, each with its own JSON manifest, plus a root
//! manifest aggregating every published post. Missed slots since a backfill
//! start are caught up in one run, and repeated runs within a slot are no-ops.

pub mod domain;
pub mod storage;
pub mod publisher;
pub mod cli;

pub use domain::{Manifest, ManifestEntry, PartitionKey, Schedule, Slug};
pub use publisher::{PublishReport, Publisher};
pub use storage::{Config, Site};
