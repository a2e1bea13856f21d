// Endpoint descriptors and the request builder.
//
// An `Endpoint` describes *what* to call (base URL, path, method, query,
// headers); `build_request` turns it into a concrete `ApiRequest`. Pure:
// no I/O, no state.

use std::fmt;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::Error;

/// Public OneStep GPS device resource.
pub const DEFAULT_BASE_URL: &str = "https://track.onestepgps.com/v3/api/public/device";

/// Everything needed to build one HTTP request.
pub trait Endpoint {
    /// Root URL, possibly already carrying a path.
    fn base_url(&self) -> &str;

    /// Path appended below the base. Empty for the base itself.
    fn path(&self) -> &str;

    fn method(&self) -> Method;

    /// Query parameters, in the order they are emitted.
    fn query(&self) -> Vec<(&str, String)>;

    /// Headers sent with the request.
    fn headers(&self) -> Vec<(&str, String)>;
}

/// A fully-formed request, ready for a [`Transport`](crate::Transport).
#[derive(Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

// The URL query carries the API key, so Debug shows the path only.
impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("host", &self.url.host_str())
            .field("path", &self.url.path())
            .field("headers", &self.headers.len())
            .finish_non_exhaustive()
    }
}

/// Compose an endpoint into a concrete request.
///
/// Fails with [`Error::InvalidUrl`] if the base does not parse, is not
/// `http(s)`, or cannot take path segments, and with
/// [`Error::InvalidHeader`] for unencodable headers.
pub fn build_request<E: Endpoint + ?Sized>(endpoint: &E) -> Result<ApiRequest, Error> {
    let base = endpoint.base_url();
    let invalid = |reason: String| Error::InvalidUrl {
        url: base.to_owned(),
        reason,
    };

    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    let path = endpoint.path().trim_matches('/');
    if !path.is_empty() {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| invalid("base URL cannot take path segments".into()))?;
        segments.pop_if_empty().extend(path.split('/'));
    }

    let query = endpoint.query();
    if !query.is_empty() {
        url.query_pairs_mut()
            .clear()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
    }

    let mut headers = HeaderMap::new();
    for (name, value) in endpoint.headers() {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidHeader {
                name: name.to_owned(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(&value).map_err(|e| Error::InvalidHeader {
            name: name.to_owned(),
            reason: e.to_string(),
        })?;
        headers.append(header_name, header_value);
    }

    Ok(ApiRequest {
        method: endpoint.method(),
        url,
        headers,
    })
}

// ── Concrete endpoints ──────────────────────────────────────────────

/// `GET {base}?latest_point=true&api-key=...`: every device with its
/// most recent telemetry point.
#[derive(Debug, Clone, Copy)]
pub struct LatestDevices<'a> {
    base_url: &'a str,
    api_key: &'a SecretString,
}

impl<'a> LatestDevices<'a> {
    pub fn new(base_url: &'a str, api_key: &'a SecretString) -> Self {
        Self { base_url, api_key }
    }
}

impl Endpoint for LatestDevices<'_> {
    fn base_url(&self) -> &str {
        self.base_url
    }

    fn path(&self) -> &str {
        ""
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn query(&self) -> Vec<(&str, String)> {
        vec![
            ("latest_point", "true".into()),
            ("api-key", self.api_key.expose_secret().to_owned()),
        ]
    }

    fn headers(&self) -> Vec<(&str, String)> {
        vec![("Accept", "application/json".into())]
    }
}
