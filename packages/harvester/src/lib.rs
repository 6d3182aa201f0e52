//! Newswire Harvester - Collect documents from a paginated archive search
//! service.
//!
//! The archive exposes its documents only through a request/response
//! protocol with a hard page-size cap and a per-query ceiling on how many
//! results a cursor can address, and every result arrives as an encoded
//! markup blob that has to be decoded and field-extracted client-side. This
//! crate covers an arbitrary date range by walking it window by window,
//! paginating each window, and streaming out decoded [`types::Document`]
//! records as they arrive.
//!
//! # Example
//!
//! ```
//! use newswire_harvester::config;
//!
//! // Validate a query date before building a descriptor
//! assert!(config::validate_date("2017-12-01").is_ok());
//! assert!(config::validate_date("12/01/2017").is_err());
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, validation, and environment configuration
//! - [`types`]: Core data types (QueryDescriptor, Document, ...)
//! - [`error`]: Error types and Result alias
//! - [`session`]: Authenticated session and the protocol-call seam
//! - [`envelope`]: SOAP request envelope builders
//! - [`xml`]: Lenient XML response helpers
//! - [`decode`]: Nested-payload document decoding and field extraction
//! - [`fetch`]: One bounded page request, normalized
//! - [`harvest`]: Temporal window harvesting over a date range
//! - [`sources`]: Source discovery
//! - [`output`]: JSON persistence glue
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod decode;
pub mod envelope;
pub mod error;
pub mod fetch;
pub mod harvest;
pub mod output;
pub mod session;
pub mod sources;
pub mod types;
pub mod xml;

// Re-export the main entry points
pub use harvest::{harvest, AbandonedWindow, Harvest, HarvestOptions, HarvestOutcome};

// Re-export commonly used items
pub use config::{Credentials, SessionConfig};
pub use error::{DecodeError, HarvestError, Result};
pub use session::{ProtocolResponse, Service, ServiceClient, Session, Throttled};
pub use types::{Document, PageRequest, PageResult, QueryDescriptor, RawEntry};
