//! Read-only news feed sources.

use crate::sync::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Candidate news item as published by the crawler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedItem {
    /// Either the article URL or an opaque crawler id.
    pub id: String,
    pub title: String,
    pub summary: String,
    pub source_id: String,
    /// External relevance score on a 0–1 scale.
    pub score: f64,
    pub matched_keywords: Vec<String>,
    pub published_at: Option<String>,
}

/// One element of a fetched feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEntry {
    Item(FeedItem),
    /// Element that could not be decoded; counted as skipped.
    Malformed { reason: String },
}

/// Source of candidate news items.
pub trait NewsFeed {
    /// Fetches the full feed.
    ///
    /// # Errors
    /// - `SyncError::UpstreamUnavailable` when the feed as a whole cannot be
    ///   read. Single undecodable elements are returned as `Malformed`.
    fn fetch(&self) -> SyncResult<Vec<FeedEntry>>;
}

impl NewsFeed for Vec<FeedItem> {
    fn fetch(&self) -> SyncResult<Vec<FeedEntry>> {
        Ok(self.iter().cloned().map(FeedEntry::Item).collect())
    }
}

/// Feed backed by a published JSON array on disk.
///
/// A missing file is an empty feed.
#[derive(Debug, Clone)]
pub struct JsonFileFeed {
    path: PathBuf,
}

impl JsonFileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: impl Into<String>) -> SyncError {
        SyncError::UpstreamUnavailable {
            upstream: self.path.display().to_string(),
            reason: reason.into(),
        }
    }
}

impl NewsFeed for JsonFileFeed {
    fn fetch(&self) -> SyncResult<Vec<FeedEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let raw = std::fs::read_to_string(&self.path)
            .map_err(|err| self.unavailable(format!("read failed: {err}")))?;
        let document: Value = serde_json::from_str(&raw)
            .map_err(|err| self.unavailable(format!("invalid JSON: {err}")))?;
        let Value::Array(elements) = document else {
            return Err(self.unavailable("feed document is not an array"));
        };

        Ok(elements.into_iter().map(decode_entry).collect())
    }
}

fn decode_entry(element: Value) -> FeedEntry {
    match serde_json::from_value::<FeedItem>(element) {
        Ok(item) => FeedEntry::Item(item),
        Err(err) => FeedEntry::Malformed {
            reason: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_entry, FeedEntry};
    use serde_json::json;

    #[test]
    fn decodes_partial_items_with_defaults() {
        let entry = decode_entry(json!({ "id": "abc", "title": "Tierschutz" }));
        let FeedEntry::Item(item) = entry else {
            panic!("expected item");
        };
        assert_eq!(item.id, "abc");
        assert_eq!(item.score, 0.0);
        assert!(item.matched_keywords.is_empty());
        assert_eq!(item.published_at, None);
    }

    #[test]
    fn wrongly_typed_elements_are_malformed() {
        assert!(matches!(
            decode_entry(json!({ "score": "hoch" })),
            FeedEntry::Malformed { .. }
        ));
        assert!(matches!(decode_entry(json!(42)), FeedEntry::Malformed { .. }));
    }
}
