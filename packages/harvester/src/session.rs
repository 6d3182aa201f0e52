//! Session management and the protocol-call seam.
//!
//! A [`Session`] holds the authentication token and the HTTP client for one
//! archive account and exposes a single capability to the layers above:
//! execute one protocol call. No retry logic lives here; callers decide
//! what a failed call means.

use std::time::{Duration, Instant};

use reqwest::blocking::Client;

use crate::config::{service_url, SessionConfig};
use crate::envelope;
use crate::error::{HarvestError, Result};
use crate::xml;

/// User agent string identifying this harvester.
const USER_AGENT: &str = concat!("newswire-harvester/", env!("CARGO_PKG_VERSION"));

/// The archive's service endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Authentication,
    Search,
    Retrieval,
    Source,
}

impl Service {
    /// Endpoint name as it appears in the service URL.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authentication => "Authentication",
            Self::Search => "Search",
            Self::Retrieval => "Retrieval",
            Self::Source => "Source",
        }
    }
}

/// Raw outcome of one protocol call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response body, typically a SOAP envelope.
    pub body: String,
}

/// The capability the fetcher and harvester consume: execute one protocol
/// call against an authenticated session.
///
/// Implemented by [`Session`]; tests substitute a scripted client.
pub trait ServiceClient {
    /// POST an envelope to a service endpoint and return the raw response.
    fn execute(&self, service: Service, envelope: &str) -> Result<ProtocolResponse>;

    /// The session token. Fails if the session is not authenticated.
    fn token(&self) -> Result<&str>;

    /// The project identifier sent with search requests.
    fn project_id(&self) -> &str;
}

/// An authenticated connection to the archive service.
pub struct Session {
    config: SessionConfig,
    http: Client,
    token: Option<String>,
}

impl Session {
    /// Create an unauthenticated session.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            config,
            http,
            token: None,
        })
    }

    /// Create a session from a token obtained elsewhere, e.g. a previous run.
    pub fn with_token(config: SessionConfig, token: impl Into<String>) -> Result<Self> {
        let mut session = Self::new(config)?;
        session.token = Some(token.into());
        Ok(session)
    }

    /// Authenticate and store the session token.
    ///
    /// Authentication always goes over https regardless of the configured
    /// protocol. Any failure here is fatal; there is no retry.
    pub fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        let request = envelope::authenticate(username, password);
        let url = service_url("https", &self.config.host, Service::Authentication.name());
        tracing::debug!(url = %url, username, "authenticating");

        let response = self.post(&url, &request)?;
        if response.status != 200 {
            return Err(HarvestError::AuthFailure {
                reason: format!("HTTP status {}", response.status),
            });
        }

        let token = parse_auth_token(&response.body)?;
        self.token = Some(token);
        Ok(())
    }

    /// Whether `authenticate` has succeeded (or a token was supplied).
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Execute one protocol call against a service endpoint.
    pub fn call(&self, service: Service, envelope: &str) -> Result<ProtocolResponse> {
        let url = service_url(&self.config.protocol, &self.config.host, service.name());
        self.post(&url, envelope)
    }

    fn post(&self, url: &str, envelope: &str) -> Result<ProtocolResponse> {
        let response = self
            .http
            .post(url)
            .header("Content-Type", "text/xml; charset=UTF-8")
            .header("SOAPAction", "")
            .body(envelope.to_string())
            .send()?;

        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(ProtocolResponse { status, body })
    }
}

impl ServiceClient for Session {
    fn execute(&self, service: Service, envelope: &str) -> Result<ProtocolResponse> {
        self.call(service, envelope)
    }

    fn token(&self) -> Result<&str> {
        self.token.as_deref().ok_or(HarvestError::NotAuthenticated)
    }

    fn project_id(&self) -> &str {
        &self.config.project_id
    }
}

/// Extract the session token from an authentication response.
pub fn parse_auth_token(body: &str) -> Result<String> {
    let doc = roxmltree::Document::parse(body)?;
    xml::descendant_text(&doc, "binarySecurityToken").ok_or_else(|| HarvestError::AuthFailure {
        reason: "no binarySecurityToken in response".to_string(),
    })
}

/// Decorator adding a fixed delay between successive calls.
///
/// The archive asks clients to pace their requests; the pacing belongs to
/// whoever owns the session, not to the harvest loop, so it lives here as a
/// wrapper the caller opts into.
pub struct Throttled<C> {
    inner: C,
    delay: Duration,
    last_call: std::sync::Mutex<Option<Instant>>,
}

impl<C: ServiceClient> Throttled<C> {
    #[must_use]
    pub fn new(inner: C, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            last_call: std::sync::Mutex::new(None),
        }
    }

    /// Give the wrapped client back, e.g. to reuse the session afterwards.
    pub fn into_inner(self) -> C {
        self.inner
    }

    fn pause(&self) {
        let Ok(mut last_call) = self.last_call.lock() else {
            return;
        };
        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                std::thread::sleep(self.delay - elapsed);
            }
        }
        *last_call = Some(Instant::now());
    }
}

impl<C: ServiceClient> ServiceClient for Throttled<C> {
    fn execute(&self, service: Service, envelope: &str) -> Result<ProtocolResponse> {
        self.pause();
        self.inner.execute(service, envelope)
    }

    fn token(&self) -> Result<&str> {
        self.inner.token()
    }

    fn project_id(&self) -> &str {
        self.inner.project_id()
    }
}
