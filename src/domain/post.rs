//! Draft and published post models
//!
//! A post lives in exactly one of two places: the draft backlog (the *tank*)
//! or an output partition. [`DraftUnit::publish`] is the only transition
//! between the two and consumes the draft.

use chrono::{DateTime, Datelike, Utc};
use std::fmt;
use std::path::PathBuf;

use super::manifest::ManifestEntry;
use super::schedule::format_timestamp;
use super::slug::Slug;
use super::template::{resolve_date, Template, DATE_PLACEHOLDER};

/// Fallback body for drafts without any content
pub const EMPTY_BODY: &str = "<p>Content coming soon.</p>";

const EXCERPT_CHARS: usize = 160;

/// How a draft is stored in the tank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftKind {
    /// Directory with `index.html` and/or `content.txt` plus assets
    Bundle,
    /// Single `.txt` file
    Flat,
}

/// Post body as read from the draft
#[derive(Debug, Clone, PartialEq)]
pub enum Markup {
    /// A complete HTML document, published as-is
    Document(String),
    /// Article markup that still needs the page template
    Article(String),
}

/// An unpublished post read from the tank
#[derive(Debug, Clone)]
pub struct DraftUnit {
    pub slug: Slug,
    pub title: String,
    pub markup: Markup,
    /// Plain-text summary, when the draft has any plain text to take it from
    pub excerpt: Option<String>,
    pub kind: DraftKind,
    /// The draft's own path (removed once published)
    pub source: PathBuf,
    /// Directory whose files are copied next to the published page
    pub assets_dir: Option<PathBuf>,
}

impl DraftUnit {
    /// Renders the draft with the publish date still unresolved
    pub fn render(&self, template: &Template) -> String {
        match &self.markup {
            Markup::Document(html) => html.clone(),
            Markup::Article(html) => template.render(&self.title, DATE_PLACEHOLDER, html),
        }
    }

    /// Turns the draft into a post published at `slot`
    pub fn publish(self, template: &Template, slot: DateTime<Utc>, url_prefix: &str) -> PublishedPost {
        let date = format_timestamp(slot);
        let html = resolve_date(&self.render(template), &date);
        let partition = PartitionKey::for_timestamp(slot);
        let url = format!(
            "{}/{}/{}/",
            url_prefix.trim_end_matches('/'),
            partition,
            self.slug
        );
        let description = self.excerpt.unwrap_or_else(|| self.title.clone());

        PublishedPost {
            slug: self.slug,
            title: self.title,
            published_at: slot,
            html,
            description,
            tags: Vec::new(),
            partition,
            url,
            source: self.source,
            assets_dir: self.assets_dir,
        }
    }
}

/// A post assigned to a slot and rendered, ready to be written out
#[derive(Debug, Clone)]
pub struct PublishedPost {
    pub slug: Slug,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub html: String,
    pub description: String,
    pub tags: Vec<String>,
    pub partition: PartitionKey,
    pub url: String,
    pub source: PathBuf,
    pub assets_dir: Option<PathBuf>,
}

impl PublishedPost {
    /// Summary entry for the partition and root manifests
    pub fn entry(&self) -> ManifestEntry {
        ManifestEntry {
            title: self.title.clone(),
            url: self.url.clone(),
            description: self.description.clone(),
            date: format_timestamp(self.published_at),
            tags: self.tags.clone(),
            image: None,
            extra: Default::default(),
        }
    }
}

/// Output partition name, one per calendar month: `2024-12-december`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn for_timestamp(ts: DateTime<Utc>) -> Self {
        let month_name = ts.format("%B").to_string().to_lowercase();
        Self(format!("{:04}-{:02}-{}", ts.year(), ts.month(), month_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// True if the markup is a complete HTML document rather than a fragment
pub fn is_full_document(html: &str) -> bool {
    html.to_ascii_lowercase().contains("<html")
}

/// Text of the document's `<title>` element, minus any ` | Site` suffix
pub fn document_title(html: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with the original
    let lower = html.to_ascii_lowercase();
    let open = lower.find("<title")?;
    let start = open + lower[open..].find('>')? + 1;
    let end = start + lower[start..].find("</title")?;

    let text = html[start..end].split(" | ").next().unwrap_or("").trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Splits a leading `Title: ...` line off plain-text content
pub fn split_title_line(text: &str) -> (Option<String>, &str) {
    let trimmed = text.trim_start();
    let (first, rest) = match trimmed.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (trimmed, ""),
    };

    match first.split_once(':') {
        Some((key, value)) if key.trim().eq_ignore_ascii_case("title") => {
            let value = value.trim();
            if value.is_empty() {
                (None, rest)
            } else {
                (Some(value.to_string()), rest)
            }
        }
        _ => (None, text),
    }
}

/// Splits plain text on blank lines into paragraphs
pub fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        out.push(current.join("\n"));
    }

    out
}

/// Wraps each paragraph of plain text in `<p>`; [`EMPTY_BODY`] if there are none
pub fn paragraphs_to_html(text: &str) -> String {
    let paras = paragraphs(text);
    if paras.is_empty() {
        return EMPTY_BODY.to_string();
    }
    paras
        .iter()
        .map(|p| format!("<p>{}</p>", p))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Short plain-text summary taken from the first paragraph
pub fn excerpt(text: &str) -> Option<String> {
    let first = paragraphs(text).into_iter().next()?;
    let plain = strip_tags(&first);
    let collapsed = plain.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    if collapsed.chars().count() <= EXCERPT_CHARS {
        return Some(collapsed);
    }

    let cut: String = collapsed.chars().take(EXCERPT_CHARS).collect();
    let cut = match cut.rfind(' ') {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    Some(format!("{}…", cut.trim_end_matches(|c: char| c.is_ascii_punctuation())))
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
