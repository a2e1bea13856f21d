// ── Core error types ──
//
// Fetch failures stay `mappulse_api::Error` so callers can match on the
// precise cause; core only adds the failures of its own surface.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A fetch failed (transport, HTTP status, decode, malformed URL).
    #[error(transparent)]
    Api(#[from] mappulse_api::Error),

    #[error("Invalid {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// `start()` was called with no Tokio runtime to spawn the loop on.
    #[error("No Tokio runtime available to run the poll loop")]
    NoRuntime,
}

impl CoreError {
    /// The underlying API error, if this is a fetch failure.
    pub fn api(&self) -> Option<&mappulse_api::Error> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}
