// ── Poll state machine ──

use std::sync::Arc;

use mappulse_api::Error as ApiError;

/// Lifecycle of a polled resource.
///
/// `Idle → Loading → (Success | Failure) → (Success | Failure) → …`
/// until the poller is stopped, which returns it to `Idle`. Only the
/// poller produces transitions; observers read clones.
#[derive(Debug, Clone, Default)]
pub enum PollState<T> {
    /// No loop running.
    #[default]
    Idle,
    /// A loop was started and has not completed its first fetch.
    Loading,
    /// The most recent fetch succeeded.
    Success(T),
    /// The most recent fetch failed. The loop keeps going.
    Failure(Arc<ApiError>),
}

impl<T> PollState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Idle | Self::Loading | Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ApiError> {
        match self {
            Self::Failure(err) => Some(err),
            Self::Idle | Self::Loading | Self::Success(_) => None,
        }
    }

    /// Short lowercase name, for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success(_) => "success",
            Self::Failure(_) => "failure",
        }
    }
}
