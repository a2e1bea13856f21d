use thiserror::Error;

/// Top-level error type for the `mappulse-api` crate.
///
/// Covers every failure of a single fetch: request construction,
/// transport, HTTP status and payload decoding. `mappulse-core` folds
/// these into `PollState::Failure` or hands them back to one-shot callers.
#[derive(Debug, Error)]
pub enum Error {
    // ── Request construction ────────────────────────────────────────
    /// Base URL, path and query could not be composed into a valid URL.
    #[error("Invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A header name or value could not be encoded.
    #[error("Invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// HTTP client construction failed (bad CA certificate, TLS backend).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Response ────────────────────────────────────────────────────
    /// The server answered with a status outside 200..=299.
    #[error("Unexpected HTTP status {status}")]
    HttpStatus { status: u16 },

    /// The body was not a valid device list, with a body preview for debugging.
    #[error("Decode error: {message}")]
    Decode { message: String, body_preview: String },
}

impl Error {
    /// Returns `true` if the underlying transport gave up waiting.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Returns `true` if this is an error a later attempt may not hit.
    ///
    /// The poller retries everything regardless; this is for callers of
    /// the one-shot path that want to decide for themselves.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::HttpStatus { status } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
