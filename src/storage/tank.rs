//! Draft backlog ("the tank")
//!
//! Each draft is either a bundle directory or a flat text file:
//!
//! ```text
//! .tank/
//! ├── deep-dive/
//! │   ├── index.html        # full page or article fragment (optional)
//! │   ├── content.txt       # plain text, used when there is no index.html
//! │   └── diagram.png       # assets, copied next to the published page
//! └── quick-note.txt        # flat draft, plain text
//! ```
//!
//! Drafts are published in lexicographic order of their lowercased names.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::atomic::write_atomic;

use crate::domain::{
    document_title, excerpt, is_full_document, paragraphs_to_html, slugify, split_title_line,
    title_from_name, DraftKind, DraftUnit, Markup, Slug, SlugError,
};

/// Pre-rendered page inside a bundle
pub const INDEX_FILE: &str = "index.html";

/// Plain-text body inside a bundle
pub const CONTENT_FILE: &str = "content.txt";

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Draft not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read draft {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Draft {path} has an unusable name: {source}")]
    Name {
        path: PathBuf,
        #[source]
        source: SlugError,
    },
}

/// Store for unpublished drafts
pub struct Tank {
    dir: PathBuf,
}

impl Tank {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists draft paths in publish order
    ///
    /// Subdirectories and `.txt` files count as drafts; hidden entries and
    /// anything else are ignored.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut units = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read tank: {}", self.dir.display()))?
        {
            let entry = entry.context("Failed to read tank entry")?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_lowercase();

            if name.starts_with('.') {
                continue;
            }
            if path.is_dir() || (path.is_file() && has_txt_extension(&path)) {
                units.push((name, path));
            }
        }

        units.sort();
        Ok(units.into_iter().map(|(_, path)| path).collect())
    }

    /// Reads a draft into a normalized unit
    pub fn read_unit(path: &Path) -> Result<DraftUnit, ReadError> {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ReadError::NotFound(path.to_path_buf()))
            }
            Err(source) => {
                return Err(ReadError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if meta.is_dir() {
            read_bundle(path)
        } else {
            read_flat(path)
        }
    }

    /// Removes a consumed draft; already-missing drafts are not an error
    pub fn remove(path: &Path) -> Result<()> {
        let result = if path.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to remove draft: {}", path.display()))
            }
        }
    }

    /// Creates a bundle draft from a title and plain-text body
    ///
    /// The title is stored as a leading `Title:` line so it survives the
    /// trip through the filename-derived slug.
    pub fn create(&self, title: &str, body: &str) -> Result<PathBuf> {
        let dir = self.dir.join(slugify(title));
        if dir.exists() {
            anyhow::bail!("Draft already exists: {}", dir.display());
        }

        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create draft: {}", dir.display()))?;

        let content = format!("Title: {}\n\n{}\n", title.trim(), body.trim());
        let path = dir.join(CONTENT_FILE);
        write_atomic(&path, content.as_bytes())
            .with_context(|| format!("Failed to write draft: {}", path.display()))?;

        Ok(dir)
    }
}

fn has_txt_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

fn read_text(path: &Path) -> Result<String, ReadError> {
    fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn slug_for(path: &Path, name: &str) -> Result<Slug, ReadError> {
    Slug::from_name(name).map_err(|source| ReadError::Name {
        path: path.to_path_buf(),
        source,
    })
}

/// Plain text → (explicit title, article markup, excerpt)
fn from_plain_text(text: &str) -> (Option<String>, String, Option<String>) {
    let (title, body) = split_title_line(text);
    (title, paragraphs_to_html(body), excerpt(body))
}

fn read_bundle(path: &Path) -> Result<DraftUnit, ReadError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let slug = slug_for(path, &name)?;
    let mut title = title_from_name(&name);

    let index = path.join(INDEX_FILE);
    let content = path.join(CONTENT_FILE);

    let (markup, excerpt) = if index.is_file() {
        let html = read_text(&index)?;
        if is_full_document(&html) {
            if let Some(explicit) = document_title(&html) {
                title = explicit;
            }
            (Markup::Document(html), None)
        } else {
            (Markup::Article(html), None)
        }
    } else if content.is_file() {
        let (explicit, html, excerpt) = from_plain_text(&read_text(&content)?);
        if let Some(explicit) = explicit {
            title = explicit;
        }
        (Markup::Article(html), excerpt)
    } else {
        (Markup::Article(paragraphs_to_html("")), None)
    };

    Ok(DraftUnit {
        slug,
        title,
        markup,
        excerpt,
        kind: DraftKind::Bundle,
        source: path.to_path_buf(),
        assets_dir: Some(path.to_path_buf()),
    })
}

fn read_flat(path: &Path) -> Result<DraftUnit, ReadError> {
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let slug = slug_for(path, &stem)?;

    let (explicit, html, excerpt) = from_plain_text(&read_text(path)?);
    let title = explicit.unwrap_or_else(|| title_from_name(&stem));

    Ok(DraftUnit {
        slug,
        title,
        markup: Markup::Article(html),
        excerpt,
        kind: DraftKind::Flat,
        source: path.to_path_buf(),
        assets_dir: None,
    })
}
