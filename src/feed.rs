//! Feed normalizer: syndication payloads in, uniform [`NewsItem`]s out.
//!
//! Parses RSS 2.0, RSS 1.0, and Atom with `quick-xml` (namespaces and CDATA
//! make regex parsing brittle). Parsing is deliberately tolerant: unknown
//! elements are skipped, and a payload that fails to parse contributes an
//! empty sequence rather than an error — a bad feed never takes down the run.
//!
//! Date resolution is an ordered strategy chain. Candidate fields are tried
//! in fixed order (`pubDate`/`published`, `updated`, `dc:date`, `date`), and
//! each candidate is run through a fixed list of parsers (RFC-3339, RFC-2822,
//! then common naive forms). The first success wins; the order is part of the
//! observable contract and must not be rearranged.

use crate::models::NewsItem;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use tracing::{debug, warn};

/// Maximum summary length before truncation, in characters.
pub const SUMMARY_LIMIT: usize = 280;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Accumulated raw fields of one `<item>` / `<entry>`.
#[derive(Debug, Default)]
struct RawEntry {
    title: String,
    link: String,
    summary: String,
    description: String,
    published: String,
    updated: String,
    dc_date: String,
    date: String,
}

/// Which entry field a text node belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    Link,
    Summary,
    Description,
    Published,
    Updated,
    DcDate,
    Date,
}

fn field_for(name: &[u8]) -> Option<Field> {
    match name {
        b"title" => Some(Field::Title),
        b"link" => Some(Field::Link),
        b"summary" => Some(Field::Summary),
        // Long-form bodies: RSS description, Atom content, content:encoded.
        b"description" | b"content" | b"content:encoded" => Some(Field::Description),
        b"pubDate" | b"published" => Some(Field::Published),
        b"updated" => Some(Field::Updated),
        b"dc:date" => Some(Field::DcDate),
        b"date" => Some(Field::Date),
        _ => None,
    }
}

impl RawEntry {
    fn buf_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Summary => &mut self.summary,
            Field::Description => &mut self.description,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
            Field::DcDate => &mut self.dc_date,
            Field::Date => &mut self.date,
        }
    }

    /// Take an Atom-style `href` from a `<link>` element. `rel="alternate"`
    /// (or no rel at all) points at the story; other rels are skipped.
    fn take_link_href(&mut self, e: &BytesStart<'_>) {
        let mut href: Option<String> = None;
        let mut rel_ok = true;
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"href" => {
                    if let Ok(v) = attr.unescape_value() {
                        href = Some(v.into_owned());
                    }
                }
                b"rel" => rel_ok = attr.value.as_ref() == b"alternate",
                _ => {}
            }
        }
        if rel_ok && self.link.trim().is_empty() {
            if let Some(href) = href {
                self.link = href;
            }
        }
    }

    fn into_item(self, source: &str) -> NewsItem {
        let long_form = if !self.description.trim().is_empty() {
            &self.description
        } else {
            &self.summary
        };
        NewsItem {
            source: source.to_string(),
            title: self.title.trim().to_string(),
            link: self.link.trim().to_string(),
            summary: truncate_summary(&clean_markup(long_form), SUMMARY_LIMIT),
            date: resolve_date(&[&self.published, &self.updated, &self.dc_date, &self.date]),
            image: None,
        }
    }
}

/// Parse a syndication payload into at most `limit` items, preserving
/// document order. A malformed payload yields an empty sequence.
pub fn normalize(bytes: &[u8], source: &str, limit: usize) -> Vec<NewsItem> {
    // No reader-level text trimming: entity references split an element's
    // text into several events, and per-event trimming would eat the spaces
    // around them. Fields are trimmed where they are consumed instead.
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();

    let mut items: Vec<NewsItem> = Vec::new();
    let mut entry: Option<RawEntry> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" | b"entry" => {
                    entry = Some(RawEntry::default());
                    field = None;
                }
                name => {
                    if let Some(raw) = entry.as_mut() {
                        field = field_for(name);
                        if field == Some(Field::Link) {
                            raw.take_link_href(&e);
                        }
                    }
                }
            },
            Ok(Event::Empty(e)) => {
                // Atom links are usually self-closing: <link href="..."/>
                if e.name().as_ref() == b"link" {
                    if let Some(raw) = entry.as_mut() {
                        raw.take_link_href(&e);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(raw), Some(f)) = (entry.as_mut(), field) {
                    match t.xml_content() {
                        Ok(text) => raw.buf_mut(f).push_str(&text),
                        Err(_) => raw
                            .buf_mut(f)
                            .push_str(&String::from_utf8_lossy(t.as_ref())),
                    }
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if let (Some(raw), Some(f)) = (entry.as_mut(), field) {
                    let dst = raw.buf_mut(f);
                    if let Ok(Some(ch)) = r.resolve_char_ref() {
                        dst.push(ch);
                    } else {
                        let name = String::from_utf8_lossy(r.as_ref());
                        match resolve_predefined_entity(&name) {
                            Some(text) => dst.push_str(text),
                            // HTML entities quick-xml does not know (&nbsp;
                            // and friends) are kept verbatim.
                            None => {
                                dst.push('&');
                                dst.push_str(&name);
                                dst.push(';');
                            }
                        }
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if let (Some(raw), Some(f)) = (entry.as_mut(), field) {
                    raw.buf_mut(f)
                        .push_str(&String::from_utf8_lossy(t.as_ref()));
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"item" | b"entry" => {
                    if let Some(raw) = entry.take() {
                        if items.len() < limit {
                            items.push(raw.into_item(source));
                        }
                        if items.len() >= limit {
                            break;
                        }
                    }
                }
                _ => field = None,
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(source, error = %e, "Feed payload failed to parse; contributing no items");
                return Vec::new();
            }
        }
        buf.clear();
    }

    debug!(source, count = items.len(), "Normalized feed entries");
    items
}

/// Strip markup tags to spaces, collapse whitespace runs, and trim.
pub fn clean_markup(s: &str) -> String {
    let stripped = TAG_RE.replace_all(s, " ");
    WS_RE.replace_all(&stripped, " ").trim().to_string()
}

/// Truncate to `limit` characters at the last space at-or-before the limit,
/// appending an ellipsis marker. Strings within the limit pass through.
pub fn truncate_summary(s: &str, limit: usize) -> String {
    let Some((cut, _)) = s.char_indices().nth(limit) else {
        return s.to_string();
    };
    let head = &s[..cut];
    let head = match head.rfind(' ') {
        Some(i) => &head[..i],
        None => head,
    };
    format!("{head}…")
}

/// Resolve the first parseable date candidate into the canonical
/// `YYYY-MM-DD HH:MM:SS` UTC form. Candidate order is fixed by the caller.
pub fn resolve_date(candidates: &[&str]) -> String {
    candidates
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .find_map(parse_date_str)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Fixed parser chain for one candidate string. Timezone-aware results are
/// converted to naive UTC.
fn parse_date_str(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Example Health Feed</title>
    <link>https://example.org</link>
    <item>
      <title> New Drug Trial Shows Promise </title>
      <link>https://example.org/a</link>
      <description><![CDATA[<p>A <b>large</b> randomized trial&nbsp;reports
        strong results.</p>]]></description>
      <pubDate>Mon, 02 Jan 2023 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Undated Finding</title>
      <link>https://example.org/b</link>
      <description>Short note.</description>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &[u8] = br#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Journal</title>
  <entry>
    <title>Genome Study Published</title>
    <link rel="alternate" href="https://journal.example.com/articles/1"/>
    <link rel="self" href="https://journal.example.com/feed/1"/>
    <summary>A brief abstract.</summary>
    <updated>2024-06-15T08:30:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_normalize_rss_basic_fields() {
        let items = normalize(RSS_SAMPLE, "Example", 60);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, "Example");
        assert_eq!(items[0].title, "New Drug Trial Shows Promise");
        assert_eq!(items[0].link, "https://example.org/a");
        assert_eq!(items[0].summary, "A large randomized trial&nbsp;reports strong results.");
        assert!(items[0].image.is_none());
    }

    #[test]
    fn test_normalize_rfc2822_date_to_canonical_utc() {
        let items = normalize(RSS_SAMPLE, "Example", 60);
        assert_eq!(items[0].date, "2023-01-02 10:00:00");
    }

    #[test]
    fn test_normalize_missing_date_is_empty_sentinel() {
        let items = normalize(RSS_SAMPLE, "Example", 60);
        assert_eq!(items[1].date, "");
    }

    #[test]
    fn test_normalize_respects_limit_in_document_order() {
        let items = normalize(RSS_SAMPLE, "Example", 1);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "New Drug Trial Shows Promise");
    }

    #[test]
    fn test_normalize_zero_cap_emits_nothing() {
        let items = normalize(RSS_SAMPLE, "Example", 0);
        assert!(items.is_empty());
    }

    #[test]
    fn test_normalize_resolves_entity_references_in_text() {
        let xml: &[u8] = br#"<rss version="2.0"><channel><item>
          <title>Food &amp; Drug News</title>
          <link>https://example.org/c?a=1&amp;b=2</link>
          <description>Costs &#8364;99 &#x2014; or less</description>
        </item></channel></rss>"#;
        let items = normalize(xml, "Example", 60);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Food & Drug News");
        assert_eq!(items[0].link, "https://example.org/c?a=1&b=2");
        assert_eq!(items[0].summary, "Costs €99 — or less");
    }

    #[test]
    fn test_normalize_keeps_unknown_entities_verbatim() {
        let xml: &[u8] = br#"<rss version="2.0"><channel><item>
          <title>Before&nbsp;After</title>
          <link>https://example.org/d</link>
        </item></channel></rss>"#;
        let items = normalize(xml, "Example", 60);
        assert_eq!(items[0].title, "Before&nbsp;After");
    }

    #[test]
    fn test_normalize_atom_entry() {
        let items = normalize(ATOM_SAMPLE, "Journal", 60);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Genome Study Published");
        assert_eq!(items[0].link, "https://journal.example.com/articles/1");
        assert_eq!(items[0].summary, "A brief abstract.");
        assert_eq!(items[0].date, "2024-06-15 08:30:00");
    }

    #[test]
    fn test_normalize_malformed_payload_yields_empty() {
        let items = normalize(b"<rss><channel><item></rss>", "Broken", 60);
        assert!(items.is_empty());
        let items = normalize(b"", "Empty", 60);
        assert!(items.is_empty());
    }

    #[test]
    fn test_clean_markup_strips_tags_and_collapses_whitespace() {
        assert_eq!(
            clean_markup("<p>Hello <b>world</b></p>\n\n  again"),
            "Hello world again"
        );
        assert_eq!(clean_markup(""), "");
    }

    #[test]
    fn test_truncate_summary_within_limit_is_untouched() {
        assert_eq!(truncate_summary("short text", 280), "short text");
    }

    #[test]
    fn test_truncate_summary_cuts_at_word_boundary() {
        let long = "word ".repeat(100);
        let out = truncate_summary(long.trim(), 280);
        assert!(out.chars().count() <= 281);
        assert!(out.ends_with("…"));
        // Never mid-word: the char before the marker completes "word".
        assert!(out.trim_end_matches('…').ends_with("word"));
    }

    #[test]
    fn test_truncate_summary_no_space_in_prefix() {
        let long = "a".repeat(300);
        let out = truncate_summary(&long, 280);
        assert_eq!(out.chars().count(), 281);
        assert!(out.ends_with("…"));
    }

    #[test]
    fn test_resolve_date_field_precedence_is_fixed() {
        // published beats updated even when both parse
        let date = resolve_date(&[
            "Mon, 02 Jan 2023 10:00:00 GMT",
            "Tue, 03 Jan 2023 11:00:00 GMT",
        ]);
        assert_eq!(date, "2023-01-02 10:00:00");
        // an unparseable earlier field falls through to the next
        let date = resolve_date(&["not a date", "Tue, 03 Jan 2023 11:00:00 GMT"]);
        assert_eq!(date, "2023-01-03 11:00:00");
    }

    #[test]
    fn test_resolve_date_converts_zone_to_utc() {
        let date = resolve_date(&["Mon, 02 Jan 2023 10:00:00 +0530"]);
        assert_eq!(date, "2023-01-02 04:30:00");
        let date = resolve_date(&["2024-06-15T08:30:00-04:00"]);
        assert_eq!(date, "2024-06-15 12:30:00");
    }

    #[test]
    fn test_resolve_date_naive_forms() {
        assert_eq!(resolve_date(&["2024-06-15 08:30:00"]), "2024-06-15 08:30:00");
        assert_eq!(resolve_date(&["2024-06-15"]), "2024-06-15 00:00:00");
    }

    #[test]
    fn test_resolve_date_all_unparseable_is_empty() {
        assert_eq!(resolve_date(&["soon", "", "yesterday"]), "");
        assert_eq!(resolve_date(&[]), "");
    }
}
