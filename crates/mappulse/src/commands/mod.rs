//! Command handlers and the session they share.

pub mod config_cmd;
pub mod fetch;
pub mod util;
pub mod watch;

use mappulse_api::TrackerClient;
use mappulse_config::{Overrides, Settings};
use mappulse_core::{PollerConfig, ProjectionConfig};

use crate::cli::GlobalOpts;
use crate::error::{CliError, RequestContext};

/// Everything a tracker-facing command needs, resolved once.
pub struct Session {
    pub client: TrackerClient,
    pub poller: PollerConfig,
    pub projection: ProjectionConfig,
    pub errors: RequestContext,
}

impl Session {
    /// Load config, apply flag overrides and build the client.
    pub fn open(global: &GlobalOpts, interval_secs: Option<u64>) -> Result<Self, CliError> {
        let config = mappulse_config::load_config()?;
        let overrides = Overrides {
            profile: global.profile.clone(),
            base_url: global.base_url.clone(),
            api_key: global.api_key.clone(),
            timeout_secs: global.timeout,
            poll_interval_secs: interval_secs,
        };
        let Settings {
            profile,
            base_url,
            api_key,
            transport,
            poller,
            projection,
        } = mappulse_config::resolve_settings(&config, &overrides)?;

        let errors = RequestContext {
            host: url::Url::parse(&base_url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_owned))
                .unwrap_or_else(|| base_url.clone()),
            profile,
            timeout_secs: transport.timeout.as_secs(),
        };
        tracing::debug!(profile = %errors.profile, host = %errors.host, "session resolved");

        let client = TrackerClient::new(base_url, api_key, &transport)
            .map_err(|e| errors.api_error(e))?;

        Ok(Self {
            client,
            poller,
            projection,
            errors,
        })
    }
}
