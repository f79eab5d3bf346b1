//! Domain models for blogpub
//!
//! Contains the scheduling, rendering and manifest logic without any I/O
//! concerns.

mod manifest;
mod post;
mod schedule;
mod slug;
mod template;

pub use manifest::{Manifest, ManifestEntry};
pub use post::{
    document_title, excerpt, is_full_document, paragraphs, paragraphs_to_html, split_title_line,
    DraftKind, DraftUnit, Markup, PartitionKey, PublishedPost, EMPTY_BODY,
};
pub use schedule::{format_timestamp, parse_timestamp, Clock, FixedClock, Schedule, SystemClock};
pub use slug::{slugify, title_from_name, Slug, SlugError};
pub use template::{resolve_date, Template, TemplateError, DATE_PLACEHOLDER};
