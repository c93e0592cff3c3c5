//! The aggregation pipeline: fetch → normalize → dedupe → enrich → rank →
//! partition.
//!
//! Fetching runs concurrently across endpoints (a small, courteous worker
//! pool with a pacing delay), but results are reassembled in catalog order
//! before de-duplication — the first-seen copy of a duplicate story wins, and
//! which source that is must stay deterministic. Everything after the fetch
//! is a pure, single-threaded transformation over the complete prior stage.

use crate::fetch::{self, FEED_TIMEOUT};
use crate::feed;
use crate::models::{FeedEndpoint, NewsItem};
use crate::thumbs::{self, HttpPageSource};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Worker-pool size for concurrent feed fetches.
const FETCH_CONCURRENCY: usize = 4;
/// Pacing delay after each feed request.
const FETCH_PACING: Duration = Duration::from_millis(250);

/// Archive bucket for items whose date never resolved.
pub const UNKNOWN_GROUP: &str = "unknown";

/// Tunables threaded in from the CLI.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Cap on total items kept after de-duplication.
    pub max_total: usize,
    /// Global thumbnail budget for the run.
    pub thumb_budget: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            max_total: 600,
            thumb_budget: 220,
        }
    }
}

/// Fetch and normalize one endpoint. Any failure contributes zero items.
async fn pull_feed(endpoint: &FeedEndpoint) -> Vec<NewsItem> {
    let items = match fetch::fetch_bytes(&endpoint.url, FEED_TIMEOUT).await {
        Ok(body) => feed::normalize(&body, &endpoint.name, endpoint.limit),
        Err(e) => {
            warn!(source = %endpoint.name, url = %endpoint.url, error = %e, "Feed unreachable; contributing no items");
            Vec::new()
        }
    };
    tokio::time::sleep(FETCH_PACING).await;
    items
}

/// Fetch every endpoint concurrently and concatenate the normalized items in
/// catalog order.
#[instrument(level = "info", skip_all, fields(sources = catalog.len()))]
pub async fn fetch_all(catalog: &[FeedEndpoint]) -> Vec<NewsItem> {
    // `buffered` (not `buffer_unordered`): output order must follow the
    // catalog because it is the dedup tie-break.
    let per_source: Vec<Vec<NewsItem>> = stream::iter(catalog)
        .map(pull_feed)
        .buffered(FETCH_CONCURRENCY)
        .collect()
        .await;

    for (endpoint, items) in catalog.iter().zip(&per_source) {
        info!(source = %endpoint.name, count = items.len(), "Source contributed items");
    }

    let raw: Vec<NewsItem> = per_source.into_iter().flatten().collect();
    info!(count = raw.len(), "Collected raw items from all sources");
    raw
}

/// Single-pass de-duplication preserving first-seen order.
///
/// Items with an empty title or link are dropped; the rest are kept the
/// first time their identity key appears, up to `max_total` in total.
pub fn dedupe(raw: Vec<NewsItem>, max_total: usize) -> Vec<NewsItem> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut items: Vec<NewsItem> = Vec::new();
    for it in raw {
        if it.title.is_empty() || it.link.is_empty() {
            continue;
        }
        if !seen.insert(it.identity_key()) {
            continue;
        }
        items.push(it);
        if items.len() >= max_total {
            break;
        }
    }
    items
}

/// Stable sort, newest first. Canonical date strings compare
/// lexicographically and the empty sentinel is the minimum, so undated items
/// land last while equal dates keep first-seen order.
pub fn rank(items: &mut [NewsItem]) {
    items.sort_by(|a, b| b.date.cmp(&a.date));
}

fn group_key(item: &NewsItem) -> String {
    if item.date.len() >= 7 {
        item.date[..7].to_string()
    } else {
        UNKNOWN_GROUP.to_string()
    }
}

/// Group items by the `YYYY-MM` prefix of their date (or `"unknown"`),
/// re-sorting each group newest first. Recomputed from scratch every run.
pub fn partition(items: &[NewsItem]) -> BTreeMap<String, Vec<NewsItem>> {
    let mut groups: BTreeMap<String, Vec<NewsItem>> = items
        .iter()
        .cloned()
        .into_group_map_by(group_key)
        .into_iter()
        .collect();
    for bucket in groups.values_mut() {
        rank(bucket);
    }
    groups
}

/// Run the full core pipeline and return the ranked dataset.
#[instrument(level = "info", skip_all, fields(sources = catalog.len()))]
pub async fn aggregate(catalog: &[FeedEndpoint], opts: &AggregateOptions) -> Vec<NewsItem> {
    let raw = fetch_all(catalog).await;

    let mut items = dedupe(raw, opts.max_total);
    info!(count = items.len(), max_total = opts.max_total, "De-duplicated items");

    thumbs::enrich(&mut items, opts.thumb_budget, &HttpPageSource).await;

    rank(&mut items);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(source: &str, title: &str, link: &str, date: &str) -> NewsItem {
        NewsItem {
            source: source.to_string(),
            title: title.to_string(),
            link: link.to_string(),
            summary: String::new(),
            date: date.to_string(),
            image: None,
        }
    }

    #[test]
    fn test_dedupe_first_iterated_source_wins() {
        let raw = vec![
            item("Google News", "New Drug Trial Shows Promise", "https://example.org/a", ""),
            item("PubMed", "New Drug Trial Shows Promise", "https://example.org/a?utm=1", ""),
        ];
        let items = dedupe(raw, 600);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, "Google News");
    }

    #[test]
    fn test_dedupe_drops_malformed_items() {
        let raw = vec![
            item("A", "", "https://example.org/a", ""),
            item("A", "Titled", "", ""),
            item("A", "Titled", "https://example.org/b", ""),
        ];
        let items = dedupe(raw, 600);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].link, "https://example.org/b");
    }

    #[test]
    fn test_dedupe_stops_at_max_total() {
        let raw: Vec<NewsItem> = (0..10)
            .map(|i| item("A", &format!("Story {i}"), &format!("https://example.org/{i}"), ""))
            .collect();
        let items = dedupe(raw, 3);
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].title, "Story 2");
    }

    #[test]
    fn test_dedupe_has_no_duplicate_keys() {
        let raw = vec![
            item("A", "One", "https://example.org/1", ""),
            item("B", "one ", "https://example.org/1#frag", ""),
            item("C", "Two", "https://example.org/2", ""),
        ];
        let items = dedupe(raw, 600);
        let keys: HashSet<String> = items.iter().map(|i| i.identity_key()).collect();
        assert_eq!(keys.len(), items.len());
    }

    #[test]
    fn test_rank_newest_first_with_undated_last() {
        let mut items = vec![
            item("A", "old", "https://e.org/1", "2023-01-02 10:00:00"),
            item("A", "undated", "https://e.org/2", ""),
            item("A", "new", "https://e.org/3", "2024-06-15 08:30:00"),
        ];
        rank(&mut items);
        assert_eq!(items[0].title, "new");
        assert_eq!(items[1].title, "old");
        assert_eq!(items[2].title, "undated");
    }

    #[test]
    fn test_rank_is_stable_for_equal_dates() {
        let mut items = vec![
            item("A", "first-seen", "https://e.org/1", "2024-01-01 00:00:00"),
            item("B", "second-seen", "https://e.org/2", "2024-01-01 00:00:00"),
        ];
        rank(&mut items);
        assert_eq!(items[0].title, "first-seen");
        assert_eq!(items[1].title, "second-seen");
    }

    #[test]
    fn test_partition_is_total_and_exclusive() {
        let items = vec![
            item("A", "jan a", "https://e.org/1", "2024-01-15 12:00:00"),
            item("A", "jan b", "https://e.org/2", "2024-01-02 09:00:00"),
            item("A", "feb", "https://e.org/3", "2024-02-01 00:00:00"),
            item("A", "undated", "https://e.org/4", ""),
        ];
        let groups = partition(&items);
        let total: usize = groups.values().map(|g| g.len()).sum();
        assert_eq!(total, items.len());
        assert_eq!(groups.keys().cloned().collect::<Vec<_>>(), vec![
            "2024-01".to_string(),
            "2024-02".to_string(),
            UNKNOWN_GROUP.to_string(),
        ]);
    }

    #[test]
    fn test_partition_groups_are_sorted_newest_first() {
        let items = vec![
            item("A", "jan early", "https://e.org/1", "2024-01-02 09:00:00"),
            item("A", "jan late", "https://e.org/2", "2024-01-15 12:00:00"),
        ];
        let groups = partition(&items);
        let jan = &groups["2024-01"];
        assert_eq!(jan[0].title, "jan late");
        assert_eq!(jan[1].title, "jan early");
    }

    #[test]
    fn test_undated_item_lands_in_unknown_group() {
        let items = vec![item("A", "undated", "https://e.org/1", "")];
        let groups = partition(&items);
        assert_eq!(groups[UNKNOWN_GROUP].len(), 1);
    }
}
