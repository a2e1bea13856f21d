// ── Runtime polling configuration ──
//
// Validated knobs handed to the poller and projection. Core never reads
// config files; `mappulse-config` builds these from profiles.

use std::time::Duration;

use crate::error::CoreError;

/// Settings for a [`Poller`](crate::Poller).
///
/// The interval is required; there is deliberately no `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    interval: Duration,
}

impl PollerConfig {
    /// Rejects a zero interval, which would turn the loop into a busy spin.
    pub fn new(interval: Duration) -> Result<Self, CoreError> {
        if interval.is_zero() {
            return Err(CoreError::InvalidConfig {
                field: "poll interval",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(Self { interval })
    }

    /// Time slept between the end of one fetch and the start of the next.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Settings for a [`StateProjection`](crate::StateProjection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionConfig {
    window: Duration,
}

impl ProjectionConfig {
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

    pub fn new(window: Duration) -> Result<Self, CoreError> {
        if window.is_zero() {
            return Err(CoreError::InvalidConfig {
                field: "throttle window",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(Self { window })
    }

    /// At most one payload is delivered per window.
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            window: Self::DEFAULT_WINDOW,
        }
    }
}
