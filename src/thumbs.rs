//! Thumbnail enrichment: fetch story pages and extract a representative
//! image URL, bounded by a global budget.
//!
//! Page fetching is the most expensive and least reliable step of the run
//! (a full page fetch and parse per item), so it is capped by a shared
//! budget rather than attempted for every item. The budget is spent only on
//! success: a page that fails to fetch or has no locatable image leaves the
//! item's `image` null and costs nothing.
//!
//! The page lookup sits behind a small trait so the budget policy can be
//! exercised in tests without touching the network.

use crate::fetch::{self, PAGE_TIMEOUT};
use crate::models::NewsItem;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

/// Meta-tag selectors tried in priority order; the first match wins.
const META_SELECTORS: &[&str] = &[
    r#"meta[property="og:image"]"#,
    r#"meta[name="twitter:image"]"#,
    r#"meta[property="og:image:url"]"#,
];

/// Fetches the HTML body of a story page, best effort.
pub trait PageSource {
    async fn page(&self, url: &str) -> Option<String>;
}

/// The production [`PageSource`]: plain HTTP GET via the shared client.
pub struct HttpPageSource;

impl PageSource for HttpPageSource {
    async fn page(&self, url: &str) -> Option<String> {
        match fetch::fetch_bytes(url, PAGE_TIMEOUT).await {
            Ok(body) => Some(String::from_utf8_lossy(&body).into_owned()),
            Err(e) => {
                debug!(%url, error = %e, "Story page fetch failed");
                None
            }
        }
    }
}

/// Locate a representative image in a story page.
///
/// Checks the Open-Graph image tag, the Twitter-card image tag, the
/// alternate Open-Graph URL variant, and finally the first inline `<img>`
/// with a `src`. Relative URLs are resolved against the page's own address.
pub fn extract_image(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    for sel in META_SELECTORS {
        let selector = Selector::parse(sel).unwrap();
        if let Some(content) = document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .filter(|c| !c.is_empty())
        {
            return resolve(base.as_ref(), content);
        }
    }

    let img_selector = Selector::parse("img[src]").unwrap();
    document
        .select(&img_selector)
        .next()
        .and_then(|el| el.value().attr("src"))
        .filter(|s| !s.is_empty())
        .and_then(|src| resolve(base.as_ref(), src))
}

fn resolve(base: Option<&Url>, candidate: &str) -> Option<String> {
    match base {
        Some(base) => base.join(candidate).ok().map(|u| u.to_string()),
        None => Url::parse(candidate).ok().map(|u| u.to_string()),
    }
}

/// Walk items in order, setting `image` until the budget is spent.
///
/// Each successful extraction costs exactly one unit; failures cost nothing.
/// Once the budget reaches zero the walk stops and all remaining items keep
/// `image = null`. Returns the number of items enriched.
#[instrument(level = "info", skip_all, fields(items = items.len(), budget = budget))]
pub async fn enrich<S: PageSource>(items: &mut [NewsItem], budget: usize, source: &S) -> usize {
    let mut remaining = budget;
    let mut enriched = 0usize;
    for item in items.iter_mut() {
        if remaining == 0 {
            break;
        }
        let Some(html) = source.page(&item.link).await else {
            continue;
        };
        let Some(image) = extract_image(&html, &item.link) else {
            continue;
        };
        item.image = Some(image);
        remaining -= 1;
        enriched += 1;
    }
    info!(enriched, spent = budget - remaining, "Thumbnail enrichment finished");
    enriched
}
