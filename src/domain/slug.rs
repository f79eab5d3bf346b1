//! Post slugs and filename-derived titles
//!
//! Slug format: lowercase, no whitespace, no path separators, no leading dot
//! (e.g. `my-first-post`). Slugs are derived from draft names: whitespace runs
//! become a single `-`, and any other characters the author used are kept; [`slugify`] produces the
//! strict `[a-z0-9-]` form used when creating new drafts from a title.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SlugError {
    #[error("Slug cannot be empty")]
    Empty,

    #[error("Invalid slug '{0}': must not contain path separators or start with '.'")]
    InvalidCharacters(String),
}

/// URL slug for a post, unique within its output partition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Derives a slug from a draft's base name (directory name or file stem)
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        name.parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.split_whitespace().collect::<Vec<_>>().join("-").to_lowercase();
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.starts_with('.') || s.contains('/') || s.contains('\\') {
            return Err(SlugError::InvalidCharacters(s));
        }
        Ok(Self(s))
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

/// Turns a free-form title into a `[a-z0-9-]` slug
///
/// `&` becomes `and`; any run of other characters outside `[a-z0-9]`
/// (spaces and hyphens included) collapses to a single hyphen. Returns `post`
/// when nothing usable remains.
pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase().replace('&', "and");

    let mut out = String::with_capacity(lowered.len());
    let mut in_run = false;
    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }

    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "post".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Derives a display title from a draft's base name
///
/// Runs of `-`, `_` and whitespace become a single space and every word is
/// title-cased:
/// `my_first-post` → `My First Post`.
pub fn title_from_name(name: &str) -> String {
    let spaced = name
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let title = spaced
        .split(' ')
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ");

    let title = title.trim();
    if title.is_empty() {
        "Untitled".to_string()
    } else {
        title.to_string()
    }
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
