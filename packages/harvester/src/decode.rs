//! Document decoding and field extraction.
//!
//! Each search-result entry carries the document as a base64-encoded markup
//! blob that must be decoded into a tree before any field can be located.
//! The markup is inconsistent across document vintages (fields have moved
//! between regions over the years), so every field is extracted through its
//! own ordered fallback chain and a miss degrades to a default instead of
//! failing the record. Only a failure of the outer decode, blob to tree,
//! fails the whole entry.

use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use scraper::{Html, Selector};

use crate::config::SENTINEL_DATE;
use crate::error::DecodeError;
use crate::types::{Document, RawEntry};

/// Publication name used when neither publication region is present.
pub const DEFAULT_PUBLICATION: &str = "No pub name";

/// Section label used when neither section region is present.
pub const DEFAULT_SECTION: &str = "No pub section";

#[allow(clippy::expect_used)] // Static selectors that are guaranteed to be valid
fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static HEADLINE: LazyLock<Selector> = LazyLock::new(|| selector("div.HEADLINE"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static SOURCE_NAME: LazyLock<Selector> = LazyLock::new(|| selector(r#"meta[name="sourceName"]"#));
static PUBLICATION: LazyLock<Selector> = LazyLock::new(|| selector("div.PUB"));
static PUB_DATE: LazyLock<Selector> = LazyLock::new(|| selector("div.PUB-DATE"));
static DATE: LazyLock<Selector> = LazyLock::new(|| selector("div.DATE"));
static LENGTH: LazyLock<Selector> = LazyLock::new(|| selector("div.LENGTH"));
static SECTION: LazyLock<Selector> = LazyLock::new(|| selector("div.SECTION"));
static SECTION_INFO: LazyLock<Selector> = LazyLock::new(|| selector("div.SECTION-INFO"));
static BYLINE: LazyLock<Selector> = LazyLock::new(|| selector("div.BYLINE"));
static ATTACHMENT: LazyLock<Selector> = LazyLock::new(|| selector("span.attachmentId"));

/// Decode one search-result entry into a [`Document`].
///
/// Pure transform: no I/O, no state. Decoding the same entry twice yields
/// an identical document.
pub fn decode(entry: &RawEntry) -> Result<Document, DecodeError> {
    let bytes = BASE64
        .decode(entry.payload.trim().as_bytes())
        .map_err(|source| DecodeError::Base64 {
            doc_id: entry.doc_id.clone(),
            source,
        })?;
    let markup = String::from_utf8(bytes).map_err(|source| DecodeError::Utf8 {
        doc_id: entry.doc_id.clone(),
        source,
    })?;
    let tree = Html::parse_document(&markup);

    Ok(Document {
        doc_id: entry.doc_id.clone(),
        headline: headline(&tree),
        attachment_id: attachment_id(&tree),
        publication: publication(&tree),
        publication_date: publication_date(&tree),
        length: length(&tree),
        section: section(&tree),
        author: author(&tree),
        full_text: None,
    })
}

/// Text of the first element matching `sel`, trimmed, if non-empty.
fn select_text(tree: &Html, sel: &Selector) -> Option<String> {
    tree.select(sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn headline(tree: &Html) -> String {
    select_text(tree, &HEADLINE)
        .or_else(|| select_text(tree, &HEADING))
        .unwrap_or_default()
}

fn attachment_id(tree: &Html) -> String {
    tree.select(&ATTACHMENT)
        .next()
        .and_then(|el| el.value().attr("id"))
        .unwrap_or_default()
        .to_string()
}

fn publication(tree: &Html) -> String {
    tree.select(&SOURCE_NAME)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| select_text(tree, &PUBLICATION))
        .unwrap_or_else(|| DEFAULT_PUBLICATION.to_string())
}

fn publication_date(tree: &Html) -> String {
    select_text(tree, &PUB_DATE)
        .or_else(|| select_text(tree, &DATE))
        .and_then(|raw| parse_free_date(&raw))
        .map(|date| date.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| SENTINEL_DATE.to_string())
}

fn length(tree: &Html) -> String {
    select_text(tree, &LENGTH)
        .map(|s| s.strip_suffix(" words").unwrap_or(&s).to_string())
        .unwrap_or_default()
}

fn section(tree: &Html) -> String {
    select_text(tree, &SECTION)
        .or_else(|| select_text(tree, &SECTION_INFO))
        .unwrap_or_else(|| DEFAULT_SECTION.to_string())
}

fn author(tree: &Html) -> String {
    select_text(tree, &BYLINE)
        .map(|s| s.strip_prefix("By ").unwrap_or(&s).to_string())
        .unwrap_or_default()
}

/// Datetime shapes seen in the wild, most specific first.
const DATETIME_FORMATS: &[&str] = &[
    "%B %d, %Y %I:%M:%S %p",
    "%B %d, %Y %I:%M %p",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%d %B %Y %I:%M %p",
    "%d %B %Y %H:%M",
];

/// Date-only shapes, tried after the datetime shapes.
const DATE_FORMATS: &[&str] = &["%B %d, %Y", "%d %B %Y", "%Y-%m-%d", "%m/%d/%Y"];

/// Parse a free-text date such as `January 3, 2017 Tuesday 5:00 PM GMT`.
///
/// Strips the last whitespace-delimited token and retries until a value
/// parses or the string is exhausted; trailing edition labels and unknown
/// timezone names fall away token by token. Weekday tokens are ignored
/// outright and a GMT/UTC marker (or none at all) reads as UTC.
pub fn parse_free_date(raw: &str) -> Option<DateTime<Utc>> {
    let mut tokens: Vec<&str> = raw.split_whitespace().collect();
    while !tokens.is_empty() {
        if let Some(parsed) = parse_tokens(&tokens) {
            return Some(parsed);
        }
        tokens.pop();
    }
    None
}

fn parse_tokens(tokens: &[&str]) -> Option<DateTime<Utc>> {
    let mut parts: Vec<&str> = tokens.iter().copied().filter(|t| !is_weekday(t)).collect();
    if parts.last().is_some_and(|t| is_utc_marker(t)) {
        parts.pop();
    }
    if parts.is_empty() {
        return None;
    }
    let joined = parts.join(" ");

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(&joined, format) {
            return Some(Utc.from_utc_datetime(&datetime));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&joined, format) {
            let midnight = date.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&midnight));
        }
    }
    None
}

fn is_weekday(token: &str) -> bool {
    matches!(
        token.trim_end_matches(',').to_ascii_lowercase().as_str(),
        "monday" | "tuesday" | "wednesday" | "thursday" | "friday" | "saturday" | "sunday"
    )
}

fn is_utc_marker(token: &str) -> bool {
    matches!(
        token.to_ascii_uppercase().as_str(),
        "GMT" | "UTC" | "UT" | "Z"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(markup: &str) -> RawEntry {
        RawEntry {
            doc_id: "02A6A252C52".to_string(),
            payload: BASE64.encode(markup),
        }
    }

    const FULL_MARKUP: &str = r#"<html><head>
        <meta name="sourceName" content="Chicago Daily Herald">
        </head><body>
        <div class="HEADLINE">Liberal arts enrollment climbs</div>
        <span class="attachmentId" id="ATT-17"></span>
        <div class="PUB">Daily Herald</div>
        <div class="PUB-DATE">January 3, 2017 Tuesday 5:00 PM GMT</div>
        <div class="LENGTH">735 words</div>
        <div class="SECTION">NEWS; Pg. 1</div>
        <div class="BYLINE">By Jane Doe</div>
        </body></html>"#;

    #[test]
    fn test_decode_full_document() {
        let doc = decode(&entry(FULL_MARKUP)).unwrap();
        assert_eq!(doc.doc_id, "02A6A252C52");
        assert_eq!(doc.headline, "Liberal arts enrollment climbs");
        assert_eq!(doc.attachment_id, "ATT-17");
        assert_eq!(doc.publication, "Chicago Daily Herald");
        assert_eq!(doc.publication_date, "2017-01-03T17:00:00Z");
        assert_eq!(doc.length, "735");
        assert_eq!(doc.section, "NEWS; Pg. 1");
        assert_eq!(doc.author, "Jane Doe");
        assert_eq!(doc.full_text, None);
    }

    #[test]
    fn test_decode_is_idempotent() {
        let entry = entry(FULL_MARKUP);
        assert_eq!(decode(&entry).unwrap(), decode(&entry).unwrap());
    }

    #[test]
    fn test_headline_falls_back_to_heading() {
        let doc = decode(&entry("<body><h1>Top story</h1></body>")).unwrap();
        assert_eq!(doc.headline, "Top story");
    }

    #[test]
    fn test_missing_fields_degrade_to_defaults() {
        let doc = decode(&entry("<body><p>nothing useful</p></body>")).unwrap();
        assert_eq!(doc.headline, "");
        assert_eq!(doc.attachment_id, "");
        assert_eq!(doc.publication, DEFAULT_PUBLICATION);
        assert_eq!(doc.publication_date, SENTINEL_DATE);
        assert_eq!(doc.length, "");
        assert_eq!(doc.section, DEFAULT_SECTION);
        assert_eq!(doc.author, "");
    }

    #[test]
    fn test_publication_falls_back_to_pub_region() {
        let doc = decode(&entry(r#"<body><div class="PUB">The Tribune</div></body>"#)).unwrap();
        assert_eq!(doc.publication, "The Tribune");
    }

    #[test]
    fn test_date_falls_back_to_generic_date_region() {
        let doc =
            decode(&entry(r#"<body><div class="DATE">March 14, 2015</div></body>"#)).unwrap();
        assert_eq!(doc.publication_date, "2015-03-14T00:00:00Z");
    }

    #[test]
    fn test_malformed_date_uses_sentinel() {
        let doc =
            decode(&entry(r#"<body><div class="PUB-DATE">sometime recently</div></body>"#))
                .unwrap();
        assert_eq!(doc.publication_date, SENTINEL_DATE);
    }

    #[test]
    fn test_section_falls_back_to_section_info() {
        let doc = decode(&entry(
            r#"<body><div class="SECTION-INFO">BUSINESS</div></body>"#,
        ))
        .unwrap();
        assert_eq!(doc.section, "BUSINESS");
    }

    #[test]
    fn test_invalid_base64_fails_entry() {
        let bad = RawEntry {
            doc_id: "X1".to_string(),
            payload: "!!! not base64 !!!".to_string(),
        };
        assert!(matches!(decode(&bad), Err(DecodeError::Base64 { .. })));
    }

    #[test]
    fn test_invalid_utf8_fails_entry() {
        let bad = RawEntry {
            doc_id: "X2".to_string(),
            payload: BASE64.encode([0xff, 0xfe, 0x00, 0x9f]),
        };
        assert!(matches!(decode(&bad), Err(DecodeError::Utf8 { .. })));
    }

    #[test]
    fn test_parse_free_date_with_weekday_time_and_zone() {
        let parsed = parse_free_date("January 3, 2017 Tuesday 5:00 PM GMT").unwrap();
        assert_eq!(parsed.format("%Y-%m-%dT%H:%M:%SZ").to_string(), "2017-01-03T17:00:00Z");
    }

    #[test]
    fn test_parse_free_date_strips_trailing_garbage() {
        let parsed =
            parse_free_date("January 3, 2017 Tuesday 5:00 PM GMT Correction Appended").unwrap();
        assert_eq!(parsed.format("%Y-%m-%dT%H:%M:%SZ").to_string(), "2017-01-03T17:00:00Z");
    }

    #[test]
    fn test_parse_free_date_date_only() {
        let parsed = parse_free_date("December 25, 2016").unwrap();
        assert_eq!(parsed.format("%Y-%m-%dT%H:%M:%SZ").to_string(), "2016-12-25T00:00:00Z");
    }

    #[test]
    fn test_parse_free_date_unknown_zone_drops_to_time() {
        // EST is not a recognized marker; the truncation loop sheds it and
        // keeps the clock time, reading it as UTC.
        let parsed = parse_free_date("January 3, 2017 5:00 PM EST").unwrap();
        assert_eq!(parsed.format("%Y-%m-%dT%H:%M:%SZ").to_string(), "2017-01-03T17:00:00Z");
    }

    #[test]
    fn test_parse_free_date_iso_form() {
        let parsed = parse_free_date("2017-06-30").unwrap();
        assert_eq!(parsed.format("%Y-%m-%dT%H:%M:%SZ").to_string(), "2017-06-30T00:00:00Z");
    }

    #[test]
    fn test_parse_free_date_exhausted_is_none() {
        assert_eq!(parse_free_date("no date here"), None);
        assert_eq!(parse_free_date(""), None);
    }
}
