//! Core data types for the harvester.

use chrono::NaiveDate;
use serde::Serialize;

/// One keyword query against one archive source over a date range.
///
/// Immutable input to a harvest run. `start_date <= end_date` is the
/// caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    /// The keyword phrase to search for.
    pub keywords: String,

    /// Numeric id of the archive source to search.
    pub source_id: u64,

    /// First day of the requested range (inclusive).
    pub start_date: NaiveDate,

    /// Last day of the requested range (inclusive).
    pub end_date: NaiveDate,
}

impl QueryDescriptor {
    #[must_use]
    pub fn new(
        keywords: impl Into<String>,
        source_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            keywords: keywords.into(),
            source_id,
            start_date,
            end_date,
        }
    }
}

/// One bounded search request: a date window plus a result cursor within it.
///
/// `result_begin`/`result_end` are 1-based inclusive positions within the
/// current date window, not global positions. The addressable range starts
/// over in every window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub query: String,
    pub source_id: u64,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub result_begin: u64,
    pub result_end: u64,
}

/// The normalized outcome of one search request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResult {
    /// HTTP status of the response.
    pub status_code: u16,

    /// Matches the service reports for the entire current window. Re-read
    /// from every page; authoritative only when `status_code` is 200.
    pub total_matches: u64,

    /// Documents decoded from this page, in response order.
    pub documents: Vec<Document>,
}

/// One undecoded search-result entry: an id and an encoded markup blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub doc_id: String,

    /// Base64-encoded markup carrying the document's metadata fields.
    pub payload: String,
}

/// A fully decoded document record.
///
/// All metadata fields are strings as delivered by the archive; absent
/// fields hold the documented default rather than failing the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    pub doc_id: String,
    pub headline: String,
    pub attachment_id: String,
    pub publication: String,

    /// ISO-8601 UTC timestamp (`YYYY-MM-DDTHH:MM:SSZ`), falling back to a
    /// fixed sentinel when the source date is missing or unparsable.
    pub publication_date: String,

    /// Word count as text, with the unit suffix stripped.
    pub length: String,

    pub section: String,
    pub author: String,

    /// Full document text, present when full-content retrieval was requested
    /// and succeeded for this document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
}
