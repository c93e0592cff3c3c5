//! The source catalog: query-driven search feeds plus the static
//! science/health feed list.
//!
//! Catalog order is load-bearing: de-duplication keeps the first-seen copy of
//! a story, so whichever source is iterated first wins the tie-break. Search
//! feeds come first (general news search, then literature search), followed
//! by the static list in declaration order. Downstream consumers depend on
//! which source's copy of a duplicate survives, so this order must not be
//! rearranged.

use crate::models::FeedEndpoint;
use std::error::Error;
use tracing::info;

/// Static science/health feeds, in tie-break order.
const BASE_FEEDS: &[(&str, &str)] = &[
    ("NIH", "https://www.nih.gov/news-events/news-releases/rss.xml"),
    ("WHO", "https://www.who.int/feeds/entity/mediacentre/news/en/rss.xml"),
    ("Nature", "https://www.nature.com/nature.rss"),
    ("BMJ", "https://www.bmj.com/latest.xml"),
    ("Lancet", "https://www.thelancet.com/rssfeed/lancet_current.xml"),
    ("PLOS Medicine", "https://journals.plos.org/plosmedicine/feed/atom"),
    ("ScienceDaily Health", "https://www.sciencedaily.com/rss/health_medicine.xml"),
    ("bioRxiv Latest", "https://www.biorxiv.org/rss/latest.xml"),
    ("medRxiv Latest", "https://www.medrxiv.org/rss/latest.xml"),
];

/// Google News RSS search URL for a free-text query.
pub fn news_search_url(query: &str) -> String {
    format!(
        "https://news.google.com/rss/search?q={}&hl=en-IN&gl=IN&ceid=IN:en",
        urlencoding::encode(query)
    )
}

/// PubMed E-utilities RSS search URL for a free-text query, newest first.
pub fn literature_search_url(query: &str) -> String {
    format!(
        "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/erss.cgi?db=pubmed&term={}&sort=date",
        urlencoding::encode(query)
    )
}

/// The built-in static feed list.
pub fn base_feeds() -> Vec<FeedEndpoint> {
    BASE_FEEDS
        .iter()
        .map(|(name, url)| FeedEndpoint::new(*name, *url))
        .collect()
}

/// Load a replacement static feed list from a YAML file.
///
/// The file is a sequence of `{name, url, limit?}` mappings; `limit`
/// defaults to 60 per endpoint.
pub fn load_feeds_file(path: &str) -> Result<Vec<FeedEndpoint>, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)?;
    let feeds: Vec<FeedEndpoint> = serde_yaml::from_str(&text)?;
    info!(path, count = feeds.len(), "Loaded feed catalog from file");
    Ok(feeds)
}

/// Build the full catalog for one run: search feeds first, then the static
/// list.
pub fn build_catalog(query: &str, base: Vec<FeedEndpoint>) -> Vec<FeedEndpoint> {
    let mut catalog = vec![
        FeedEndpoint::new("Google News", news_search_url(query)),
        FeedEndpoint::new("PubMed", literature_search_url(query)),
    ];
    catalog.extend(base);
    catalog
}
