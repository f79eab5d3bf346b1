//! Feed manifests
//!
//! A manifest is a `{"posts": [...]}` document listing post summaries. Each
//! output partition has one, sorted oldest first; the root manifest is the
//! union of all of them, newest first.
//!
//! Reading is lenient about older hand-written manifests: `href` and `blurb`
//! are accepted for `url` and `description`, a `projects` list stands in for
//! `posts`, and missing or `null` fields default to empty. Keys this crate
//! does not know are kept and written back unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::schedule::parse_timestamp;

/// One post summary in a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, alias = "href", deserialize_with = "null_as_default")]
    pub url: String,

    #[serde(default, alias = "blurb", deserialize_with = "null_as_default")]
    pub description: String,

    /// ISO-8601 UTC date (`2024-12-01T00:00:00Z`)
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,

    #[serde(default, alias = "thumb", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Hand-added keys, preserved across rewrites
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ManifestEntry {
    /// Parsed date; `None` for entries with a missing or malformed date
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.date).ok()
    }
}

/// A list of post summaries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, alias = "projects", deserialize_with = "null_as_default")]
    pub posts: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(posts: Vec<ManifestEntry>) -> Self {
        Self { posts }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Replaces any entry with the same URL, then re-sorts oldest first
    pub fn upsert(&mut self, entry: ManifestEntry) {
        self.posts.retain(|p| p.url != entry.url);
        self.posts.push(entry);
        self.sort_ascending();
    }

    /// Oldest first; undated entries sort before dated ones
    pub fn sort_ascending(&mut self) {
        self.posts.sort_by_key(ManifestEntry::timestamp);
    }

    /// Newest first; undated entries sort last
    pub fn sort_descending(&mut self) {
        self.posts
            .sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    }

    /// Merges manifests into one list sorted newest first
    ///
    /// Sorting is stable, so entries sharing a date keep the order in which
    /// the manifests were supplied.
    pub fn aggregate<I>(manifests: I) -> Self
    where
        I: IntoIterator<Item = Manifest>,
    {
        let mut merged = Self::new(manifests.into_iter().flat_map(|m| m.posts).collect());
        merged.sort_descending();
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, date: &str, title: &str) -> ManifestEntry {
        ManifestEntry {
            title: title.to_string(),
            url: url.to_string(),
            description: title.to_string(),
            date: date.to_string(),
            tags: vec![],
            image: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn upsert_replaces_same_url() {
        let mut manifest = Manifest::default();
        manifest.upsert(entry("/a/", "2024-12-01T12:00:00Z", "Old"));
        manifest.upsert(entry("/b/", "2024-12-01T00:00:00Z", "B"));
        manifest.upsert(entry("/a/", "2024-12-02T00:00:00Z", "New"));

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.posts[0].url, "/b/");
        assert_eq!(manifest.posts[1].title, "New");
    }

    #[test]
    fn aggregate_sorts_newest_first() {
        let dec = Manifest::new(vec![
            entry("/1/", "2024-12-01T00:00:00Z", "1"),
            entry("/2/", "2024-12-01T12:00:00Z", "2"),
        ]);
        let jan = Manifest::new(vec![entry("/3/", "2025-01-01T00:00:00Z", "3")]);

        let root = Manifest::aggregate([dec, jan]);
        let urls: Vec<_> = root.posts.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["/3/", "/2/", "/1/"]);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let a = Manifest::new(vec![
            entry("/1/", "2024-12-01T00:00:00Z", "1"),
            entry("/2/", "2024-12-01T12:00:00Z", "2"),
        ]);
        let once = Manifest::aggregate([a]);
        let twice = Manifest::aggregate([once.clone()]);
        assert_eq!(once, twice);
    }

    #[test]
    fn undated_entries_sort_last_in_root() {
        let m = Manifest::new(vec![
            entry("/undated/", "", "u"),
            entry("/dated/", "2024-12-01T00:00:00Z", "d"),
        ]);
        let root = Manifest::aggregate([m]);
        assert_eq!(root.posts[0].url, "/dated/");
        assert_eq!(root.posts[1].url, "/undated/");
    }

    #[test]
    fn lenient_field_names() {
        let json = r#"{"projects": [{"title": "P", "href": "/p/", "blurb": "About P", "thumb": "/p.png"}]}"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        let p = &manifest.posts[0];
        assert_eq!(p.url, "/p/");
        assert_eq!(p.description, "About P");
        assert_eq!(p.image.as_deref(), Some("/p.png"));
        assert!(p.tags.is_empty());
        assert_eq!(p.timestamp(), None);
    }

    #[test]
    fn serializes_posts_key_without_image() {
        let manifest = Manifest::new(vec![entry("/a/", "2024-12-01T00:00:00Z", "A")]);
        let value = serde_json::to_value(&manifest).unwrap();
        assert!(value.get("posts").is_some());
        assert!(value["posts"][0].get("image").is_none());
        assert_eq!(value["posts"][0]["tags"], serde_json::json!([]));
    }

    #[test]
    fn null_fields_read_as_empty() {
        let json = r#"{"posts": [
            {"title": null, "url": "/a/", "description": null, "date": null, "tags": null, "image": null}
        ]}"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        let a = &manifest.posts[0];
        assert_eq!(a.title, "");
        assert_eq!(a.url, "/a/");
        assert_eq!(a.date, "");
        assert!(a.tags.is_empty());
        assert_eq!(a.image, None);

        let empty: Manifest = serde_json::from_str(r#"{"posts": null}"#).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn unknown_keys_survive_rewrite() {
        let json = r#"{"posts": [
            {"title": "A", "url": "/a/", "date": "2024-12-01T00:00:00Z", "source": "posted", "slug": "a"}
        ]}"#;
        let mut manifest: Manifest = serde_json::from_str(json).unwrap();
        manifest.upsert(entry("/b/", "2024-12-02T00:00:00Z", "B"));

        let value = serde_json::to_value(&manifest).unwrap();
        let a = &value["posts"][0];
        assert_eq!(a["url"], "/a/");
        assert_eq!(a["source"], "posted");
        assert_eq!(a["slug"], "a");
        assert!(value["posts"][1].get("source").is_none());
    }
}
