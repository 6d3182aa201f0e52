//! Source discovery: which archive sources can this account search?
//!
//! The archive organizes sources into folders. Browsing a folder returns
//! either its sub-folders or, at the leaves, the sources themselves; the
//! name search skips the hierarchy and matches sources directly.

use roxmltree::Node;

use crate::envelope;
use crate::error::{HarvestError, Result};
use crate::session::{Service, ServiceClient};
use crate::xml;

/// Metadata for one searchable source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub name: String,
    pub source_id: u64,
    pub kind: String,
    pub premium_source: bool,
    pub has_index: bool,
    pub versionable: bool,
    pub page_browsable: bool,

    /// Which other sources this one may be combined with in a single
    /// search. Only populated by the name search.
    pub combinability: Vec<String>,
}

/// One folder in the source hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFolder {
    pub name: String,
    pub folder_id: String,
}

/// What browsing a folder returned: deeper folders or actual sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceListing {
    Folders(Vec<SourceFolder>),
    Sources(Vec<SourceInfo>),
}

/// Search sources by partial name.
pub fn search_sources<C: ServiceClient + ?Sized>(
    client: &C,
    partial_name: &str,
) -> Result<Vec<SourceInfo>> {
    let envelope = envelope::search_sources(client.token()?, partial_name);
    let response = client.execute(Service::Source, &envelope)?;
    if response.status != 200 {
        return Err(HarvestError::ServiceStatus {
            service: "Source",
            status: response.status,
        });
    }
    parse_sources(&response.body)
}

/// Browse the source hierarchy. Without a folder id the top-level folders
/// are returned.
pub fn browse_sources<C: ServiceClient + ?Sized>(
    client: &C,
    folder_id: Option<&str>,
) -> Result<SourceListing> {
    let envelope = envelope::browse_sources(client.token()?, folder_id);
    let response = client.execute(Service::Source, &envelope)?;
    if response.status != 200 {
        return Err(HarvestError::ServiceStatus {
            service: "Source",
            status: response.status,
        });
    }
    parse_source_listing(&response.body)
}

/// Parse a `SearchSources` response body.
pub fn parse_sources(body: &str) -> Result<Vec<SourceInfo>> {
    let doc = roxmltree::Document::parse(body)?;
    Ok(xml::descendants_named(&doc, "source")
        .filter_map(parse_source)
        .collect())
}

/// Parse a `BrowseSources` response body.
pub fn parse_source_listing(body: &str) -> Result<SourceListing> {
    let doc = roxmltree::Document::parse(body)?;

    let sources: Vec<SourceInfo> = xml::descendants_named(&doc, "source")
        .filter_map(parse_source)
        .collect();
    if !sources.is_empty() {
        return Ok(SourceListing::Sources(sources));
    }

    let folders = xml::descendants_named(&doc, "folder")
        .filter_map(|node| {
            Some(SourceFolder {
                name: xml::child_text(node, "name")?,
                folder_id: xml::child_text(node, "folderId")?,
            })
        })
        .collect();
    Ok(SourceListing::Folders(folders))
}

fn parse_source(node: Node<'_, '_>) -> Option<SourceInfo> {
    let name = xml::child_text(node, "name")?;
    let source_id = xml::child_text(node, "sourceId")?.parse().ok()?;
    let combinability = node
        .children()
        .filter(|child| xml::local_name_is(*child, "combinability"))
        .map(xml::node_text)
        .filter(|s| !s.is_empty())
        .collect();
    Some(SourceInfo {
        name,
        source_id,
        kind: xml::child_text(node, "type").unwrap_or_default(),
        premium_source: flag(node, "premiumSource"),
        has_index: flag(node, "hasIndex"),
        versionable: flag(node, "versionable"),
        page_browsable: flag(node, "isPageBrowsable"),
        combinability,
    })
}

fn flag(node: Node<'_, '_>, name: &str) -> bool {
    xml::child_text(node, name).is_some_and(|text| text.eq_ignore_ascii_case("true"))
}
