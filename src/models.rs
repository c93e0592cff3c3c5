//! Data models for feed endpoints and aggregated news items.
//!
//! This module defines the core data structures used throughout the application:
//! - [`FeedEndpoint`]: A named syndication URL with a per-source item cap
//! - [`NewsItem`]: One normalized story as it flows through dedup, enrichment,
//!   ranking, and partitioning, and as it is serialized into the dataset
//!
//! The serialized field names of [`NewsItem`] (`source`, `title`, `link`,
//! `summary`, `date`, `image`) are consumed by the rendering pages and the
//! client-side search script, so they are a stable public contract.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

fn default_limit() -> usize {
    60
}

/// A single feed endpoint in the source catalog.
///
/// Endpoints are immutable once the catalog is built. The `limit` caps how
/// many entries are taken from this feed per run; it defaults to 60 when the
/// endpoint comes from a YAML catalog file that omits it.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEndpoint {
    /// Human-readable source label, copied onto every item from this feed.
    pub name: String,
    /// The RSS/Atom URL to fetch.
    pub url: String,
    /// Maximum entries taken from this feed, in document order.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl FeedEndpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            limit: default_limit(),
        }
    }
}

/// One normalized news item.
///
/// Produced by the feed normalizer and then only mutated by the thumbnail
/// enricher (which sets `image`). An empty `date` means the publish time
/// could not be resolved; such items rank after every dated item and land in
/// the `"unknown"` archive group.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewsItem {
    /// Label of the feed this item came from.
    pub source: String,
    /// Story headline, trimmed verbatim from the entry.
    pub title: String,
    /// Absolute story URL, trimmed verbatim from the entry.
    pub link: String,
    /// Plain-text summary, markup-stripped and truncated.
    pub summary: String,
    /// Canonical `YYYY-MM-DD HH:MM:SS` UTC string, or `""` if unresolvable.
    pub date: String,
    /// Representative image URL, set by the thumbnail enricher.
    pub image: Option<String>,
}

impl NewsItem {
    /// Stable identity digest for de-duplication.
    ///
    /// Two items with the same link host and the same lowercased, trimmed
    /// title are the same story regardless of which feed supplied them, so
    /// query-string variants (`?utm=...`) of the same URL collapse together.
    pub fn identity_key(&self) -> String {
        let host = Url::parse(&self.link)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
            .unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(host.as_bytes());
        hasher.update(b"|");
        hasher.update(self.title.trim().to_lowercase().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
