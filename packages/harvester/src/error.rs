//! Error types for the harvester.
//!
//! Uses the dual-error pattern: `HarvestError` for library consumers with
//! detailed error context, and `DecodeError` for the per-entry payload
//! decode boundary, where a failure skips one entry rather than a page.

use thiserror::Error;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Authentication with the archive service failed.
    #[error("Authentication failed: {reason}. Verify your credentials and host")]
    AuthFailure { reason: String },

    /// An operation that requires a token was attempted before `authenticate`.
    #[error("Session is not authenticated")]
    NotAuthenticated,

    /// HTTP request failed at the transport level.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A service answered with a non-success HTTP status.
    #[error("{service} request failed with HTTP status {status}")]
    ServiceStatus { service: &'static str, status: u16 },

    /// Invalid date format.
    #[error("Invalid date: '{0}'. Expected YYYY-MM-DD (e.g., 2017-12-01)")]
    InvalidDate(String),

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// Missing required XML element.
    #[error("Missing required element: {element} in {context}")]
    MissingElement { element: String, context: String },

    /// A search-result entry could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A required environment variable is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure decoding the nested payload of one search-result entry.
///
/// Raised only when the outer blob cannot be turned into a markup tree at
/// all. Individual missing fields degrade to defaults instead.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not valid base64.
    #[error("payload of document {doc_id} is not valid base64: {source}")]
    Base64 {
        doc_id: String,
        #[source]
        source: base64::DecodeError,
    },

    /// The decoded payload is not valid UTF-8.
    #[error("payload of document {doc_id} is not valid UTF-8: {source}")]
    Utf8 {
        doc_id: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_display() {
        let err = HarvestError::AuthFailure {
            reason: "no token in response".to_string(),
        };
        assert!(err.to_string().contains("no token in response"));
    }

    #[test]
    fn test_service_status_display() {
        let err = HarvestError::ServiceStatus {
            service: "Retrieval",
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "Retrieval request failed with HTTP status 503"
        );
    }

    #[test]
    fn test_decode_error_carries_doc_id() {
        let source = match base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            "not base64!",
        ) {
            Err(e) => e,
            Ok(_) => unreachable!("input is not valid base64"),
        };
        let err = DecodeError::Base64 {
            doc_id: "02A6A252C52".to_string(),
            source,
        };
        assert!(err.to_string().contains("02A6A252C52"));
    }
}
