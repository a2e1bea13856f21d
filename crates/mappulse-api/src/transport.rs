// HTTP transport abstraction.
//
// A `Transport` performs exactly one HTTP exchange for an already-built
// `ApiRequest`. No retries and no caching live here; the poller owns
// retry policy. `HttpTransport` is the reqwest-backed default.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::endpoint::ApiRequest;
use crate::error::Error;

const USER_AGENT: &str = concat!("mappulse/", env!("CARGO_PKG_VERSION"));

/// Raw outcome of one HTTP exchange: status plus undecoded body.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    /// `true` for statuses in 200..=299.
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Performs a single HTTP exchange.
///
/// Implementations fail with [`Error::Transport`] when the connection
/// cannot be established, times out, or the body cannot be read. The
/// status code is never interpreted here.
pub trait Transport: Send + Sync + 'static {
    fn perform(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<RawResponse, Error>> + Send;
}

/// TLS verification mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the bundled root certificate store.
    #[default]
    System,
    /// Additionally trust a CA certificate from the given PEM file.
    CustomCa(PathBuf),
}

/// Settings for building the reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Upper bound for a whole request, connect through body.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        if let TlsMode::CustomCa(path) = &self.tls {
            let cert_pem = std::fs::read(path)
                .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
            let cert = reqwest::Certificate::from_pem(&cert_pem)
                .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Default [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: config.build_client()?,
        })
    }

    /// Wrap a pre-built client (tests, shared connection pools).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for HttpTransport {
    async fn perform(&self, request: ApiRequest) -> Result<RawResponse, Error> {
        let ApiRequest {
            method,
            url,
            headers,
        } = request;

        // The query string carries the API key: only the path is logged,
        // and errors are stripped of their URL.
        debug!(%method, host = url.host_str().unwrap_or("-"), path = url.path(), "sending request");

        let resp = self
            .http
            .request(method, url)
            .headers(headers)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(reqwest::Error::without_url)?;
        trace!(status, bytes = body.len(), "response received");

        Ok(RawResponse { status, body })
    }
}
