//! Persistence glue: JSON files for harvested documents.
//!
//! The harvester itself only yields [`Document`] values; this module is the
//! collaborator that puts them somewhere. Each document becomes one
//! pretty-printed JSON file named after the query, so runs over different
//! queries or ranges never collide.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use scraper::{Html, Selector};
use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::types::{Document, QueryDescriptor};

#[allow(clippy::expect_used)] // Static selector that is guaranteed to be valid
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.BODY").expect("valid selector"));

/// Filename stem identifying a query: source id, compacted keywords, range.
///
/// # Examples
/// ```
/// use newswire_harvester::output::query_slug;
/// use newswire_harvester::types::QueryDescriptor;
///
/// let query = QueryDescriptor::new(
///     "Liberal Arts",
///     163823,
///     "2017-01-01".parse().unwrap(),
///     "2017-02-01".parse().unwrap(),
/// );
/// assert_eq!(query_slug(&query), "163823_liberalarts_2017-01-01_2017-02-01");
/// ```
#[must_use]
pub fn query_slug(query: &QueryDescriptor) -> String {
    let keywords: String = query
        .keywords
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    format!(
        "{}_{}_{}_{}",
        query.source_id, keywords, query.start_date, query.end_date
    )
}

/// Writes each document of one query to its own JSON file.
pub struct DocumentWriter {
    dir: PathBuf,
    slug: String,
    seq: usize,
}

impl DocumentWriter {
    /// Create the output directory if needed and set up naming for `query`.
    pub fn new(dir: impl Into<PathBuf>, query: &QueryDescriptor) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            slug: query_slug(query),
            seq: 0,
        })
    }

    /// Write one document, returning the path it landed at.
    pub fn write(&mut self, document: &Document) -> Result<PathBuf> {
        let path = self.dir.join(format!("{}_{:04}.json", self.slug, self.seq));
        self.seq += 1;
        fs::write(&path, serde_json::to_string_pretty(document)?)?;
        Ok(path)
    }

    /// How many documents have been written.
    #[must_use]
    pub fn written(&self) -> usize {
        self.seq
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Plain text of the body regions of a full-text markup blob.
///
/// Concatenates every `div.BODY` region and normalizes the result the way
/// the downstream corpus expects: accents folded away, printable ASCII
/// only, runs of whitespace collapsed to single spaces.
#[must_use]
pub fn body_text(full_text_markup: &str) -> String {
    let tree = Html::parse_document(full_text_markup);
    let raw: String = tree
        .select(&BODY)
        .flat_map(|region| region.text())
        .collect::<Vec<_>>()
        .join(" ");
    clean_text(&raw)
}

/// Fold to printable ASCII and collapse whitespace.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|c| c.is_ascii() && (c.is_ascii_graphic() || c.is_ascii_whitespace()))
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
