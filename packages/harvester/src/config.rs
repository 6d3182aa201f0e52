//! Configuration constants and validation functions for the harvester.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{HarvestError, Result};

/// Path prefix shared by all service endpoints on the archive host.
pub const SERVICE_PATH: &str = "/wsapi/v1/services/";

/// HTTP timeout in seconds.
///
/// Set to 30 seconds to accommodate large result pages and slow connections.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Results per page. The service caps each request at this many documents.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Default width of a date window, in days.
pub const DEFAULT_STRIDE_DAYS: i64 = 30;

/// Timestamp emitted for documents whose publication date cannot be parsed.
pub const SENTINEL_DATE: &str = "1900-01-01T00:00:00Z";

/// Date pattern: YYYY-MM-DD.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

/// Validate and parse a date string in YYYY-MM-DD format.
///
/// # Arguments
/// * `date_str` - Date string to validate
///
/// # Returns
/// * `Ok(NaiveDate)` if the format and calendar date are valid
/// * `Err(HarvestError::InvalidDate)` otherwise
///
/// # Examples
/// ```
/// use newswire_harvester::config::validate_date;
///
/// assert!(validate_date("2017-12-01").is_ok());
/// assert!(validate_date("invalid").is_err());
/// assert!(validate_date("2017-13-01").is_err()); // Invalid month
/// ```
pub fn validate_date(date_str: &str) -> Result<chrono::NaiveDate> {
    if !DATE_PATTERN.is_match(date_str) {
        return Err(HarvestError::InvalidDate(date_str.to_string()));
    }

    chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| HarvestError::InvalidDate(date_str.to_string()))
}

/// Build the URL for a service endpoint.
///
/// # Examples
/// ```
/// use newswire_harvester::config::service_url;
///
/// assert_eq!(
///     service_url("http", "archive.example.com", "Search"),
///     "http://archive.example.com/wsapi/v1/services/Search"
/// );
/// ```
pub fn service_url(protocol: &str, host: &str, service: &str) -> String {
    format!("{protocol}://{host}{SERVICE_PATH}{service}")
}

/// Connection settings for a [`crate::session::Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Archive host, e.g. `archive.example.com` or `127.0.0.1:8080`.
    pub host: String,

    /// Project identifier sent with every search request.
    pub project_id: String,

    /// Protocol for service calls (`http` or `https`).
    pub protocol: String,

    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl SessionConfig {
    /// Create a config with default protocol and timeout.
    #[must_use]
    pub fn new(host: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            project_id: project_id.into(),
            protocol: "http".to_string(),
            timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }

    /// Load connection settings from environment variables.
    ///
    /// `NEWSWIRE_HOST` and `NEWSWIRE_PROJECT_ID` are required;
    /// `NEWSWIRE_PROTOCOL` and `NEWSWIRE_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self> {
        let host =
            std::env::var("NEWSWIRE_HOST").map_err(|_| HarvestError::MissingEnvVar("NEWSWIRE_HOST"))?;

        let project_id = std::env::var("NEWSWIRE_PROJECT_ID")
            .map_err(|_| HarvestError::MissingEnvVar("NEWSWIRE_PROJECT_ID"))?;

        let protocol = std::env::var("NEWSWIRE_PROTOCOL").unwrap_or_else(|_| "http".to_string());

        let timeout_secs = std::env::var("NEWSWIRE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(HTTP_TIMEOUT_SECS);

        Ok(Self {
            host,
            project_id,
            protocol,
            timeout_secs,
        })
    }
}

/// Account credentials for [`crate::session::Session::authenticate`].
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Load credentials from `NEWSWIRE_USERNAME` and `NEWSWIRE_PASSWORD`.
    pub fn from_env() -> Result<Self> {
        let username = std::env::var("NEWSWIRE_USERNAME")
            .map_err(|_| HarvestError::MissingEnvVar("NEWSWIRE_USERNAME"))?;
        let password = std::env::var("NEWSWIRE_PASSWORD")
            .map_err(|_| HarvestError::MissingEnvVar("NEWSWIRE_PASSWORD"))?;
        Ok(Self { username, password })
    }
}

// No Debug derive on Credentials: the password would end up in logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
