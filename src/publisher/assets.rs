//! Writing a published post to its partition directory

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::domain::PublishedPost;
use crate::storage::{write_atomic, CONTENT_FILE, INDEX_FILE};

/// Writes `index.html` and copies the draft's assets into `target`
///
/// Root-level `index.html` and `content.txt` of the bundle are source files
/// for the page itself and are not copied. Returns the number of assets copied.
pub fn write_post(post: &PublishedPost, target: &Path) -> Result<usize> {
    fs::create_dir_all(target)
        .with_context(|| format!("Failed to create post directory: {}", target.display()))?;

    write_atomic(&target.join(INDEX_FILE), post.html.as_bytes())
        .with_context(|| format!("Failed to write page for {}", post.slug))?;

    match &post.assets_dir {
        Some(dir) if dir.is_dir() => copy_assets(dir, target),
        _ => Ok(0),
    }
}

fn copy_assets(source: &Path, target: &Path) -> Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry
            .with_context(|| format!("Failed to walk assets in {}", source.display()))?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .context("Asset path outside of its bundle")?;

        if entry.depth() == 1 && (rel == Path::new(INDEX_FILE) || rel == Path::new(CONTENT_FILE)) {
            continue;
        }

        let dest = target.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)
                .with_context(|| format!("Failed to create directory: {}", dest.display()))?;
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::copy(entry.path(), &dest).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                entry.path().display(),
                dest.display()
            )
        })?;
        copied += 1;
    }

    Ok(copied)
}
