//! Page fetching: one bounded search request, normalized.
//!
//! A page fetch issues a single search call for one date window and one
//! result cursor and normalizes whatever comes back into a [`PageResult`].
//! The service re-reports the window's total match count on every page; a
//! missing or unparsable count reads as zero matches rather than an error,
//! matching observed server behavior. Entries that fail to decode are
//! logged and skipped; they never abort the page.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::decode;
use crate::envelope;
use crate::error::{DecodeError, HarvestError, Result};
use crate::session::{Service, ServiceClient};
use crate::types::{PageRequest, PageResult, RawEntry};
use crate::xml;

/// Issue one search request and normalize the outcome.
///
/// Transport-level failures are `Err`; an HTTP response of any status is
/// `Ok`. On a non-200 status or a zero total the document list is empty and
/// the body is not parsed further. When `include_full_text` is set, one
/// extra retrieval round-trip per decoded document populates `full_text`; a
/// failure there is logged and leaves that document without full text.
pub fn fetch_page<C: ServiceClient + ?Sized>(
    client: &C,
    request: &PageRequest,
    include_full_text: bool,
) -> Result<PageResult> {
    let envelope = envelope::search(client.token()?, client.project_id(), request);
    tracing::debug!(
        query = %request.query,
        source_id = request.source_id,
        window_start = %request.window_start,
        window_end = %request.window_end,
        begin = request.result_begin,
        end = request.result_end,
        "issuing search request"
    );

    let response = client.execute(Service::Search, &envelope)?;
    let mut page = PageResult {
        status_code: response.status,
        total_matches: 0,
        documents: Vec::new(),
    };
    if page.status_code != 200 {
        return Ok(page);
    }

    let doc = match roxmltree::Document::parse(&response.body) {
        Ok(doc) => doc,
        Err(error) => {
            tracing::warn!(%error, "unparsable search response, treating as empty page");
            return Ok(page);
        }
    };

    page.total_matches = xml::descendant_text(&doc, "documentsFound")
        .and_then(|text| text.parse().ok())
        .unwrap_or(0);
    if page.total_matches == 0 {
        return Ok(page);
    }

    for container in xml::descendants_named(&doc, "documentContainer") {
        let Some(doc_id) = xml::child_text(container, "documentId") else {
            tracing::warn!("skipping result entry without a document id");
            continue;
        };
        let Some(payload) = xml::child_text(container, "document") else {
            tracing::warn!(%doc_id, "skipping result entry without a payload");
            continue;
        };

        match decode::decode(&RawEntry { doc_id, payload }) {
            Ok(mut document) => {
                if include_full_text {
                    match fetch_full_text(client, &document.doc_id) {
                        Ok(text) => document.full_text = Some(text),
                        Err(error) => tracing::warn!(
                            doc_id = %document.doc_id,
                            %error,
                            "full text fetch failed, keeping document without it"
                        ),
                    }
                }
                page.documents.push(document);
            }
            Err(error) => tracing::warn!(%error, "skipping entry that failed to decode"),
        }
    }

    Ok(page)
}

/// Fetch one document's full text through the retrieval service.
pub fn fetch_full_text<C: ServiceClient + ?Sized>(client: &C, doc_id: &str) -> Result<String> {
    let envelope = envelope::retrieve_document(client.token()?, doc_id);
    let response = client.execute(Service::Retrieval, &envelope)?;
    if response.status != 200 {
        return Err(HarvestError::ServiceStatus {
            service: "Retrieval",
            status: response.status,
        });
    }

    let doc = roxmltree::Document::parse(&response.body)?;
    let encoded =
        xml::descendant_text(&doc, "document").ok_or_else(|| HarvestError::MissingElement {
            element: "document".to_string(),
            context: "retrieval response".to_string(),
        })?;

    let bytes = BASE64
        .decode(encoded.trim().as_bytes())
        .map_err(|source| DecodeError::Base64 {
            doc_id: doc_id.to_string(),
            source,
        })?;
    let text = String::from_utf8(bytes).map_err(|source| DecodeError::Utf8 {
        doc_id: doc_id.to_string(),
        source,
    })?;
    Ok(text)
}
