//! CLI error types with miette diagnostics.
//!
//! Maps API, core and config errors into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use mappulse_config::ConfigError;
use mappulse_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the tracker at {host}")]
    #[diagnostic(
        code(mappulse::connection_failed),
        help(
            "Check your network connection and the endpoint URL.\n\
             Host: {host}\n\
             Override it with --base-url or `mappulse config set base_url <URL>`."
        )
    )]
    ConnectionFailed {
        host: String,
        #[source]
        source: mappulse_api::Error,
    },

    #[error("Could not set up TLS: {reason}")]
    #[diagnostic(
        code(mappulse::tls_error),
        help("Check the ca_cert path in your profile points at a readable PEM file.")
    )]
    Tls { reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(mappulse::timeout),
        help("Increase the timeout with --timeout or check the tracker's responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("The tracker rejected the API key (HTTP {status})")]
    #[diagnostic(
        code(mappulse::auth_failed),
        help(
            "Verify the API key for profile '{profile}'.\n\
             Store a new one with: mappulse config set-key --api-key <KEY>"
        )
    )]
    AuthFailed { status: u16, profile: String },

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(mappulse::no_credentials),
        help(
            "Pass --api-key, set MAPPULSE_API_KEY, or run:\n\
             mappulse config set-key --api-key <KEY>"
        )
    )]
    NoCredentials { profile: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("The tracker answered with HTTP {status}")]
    #[diagnostic(code(mappulse::http_status))]
    HttpStatus { status: u16 },

    #[error("Unexpected response from the tracker: {message}")]
    #[diagnostic(
        code(mappulse::decode),
        help("Run with -vv to log the response body preview.")
    )]
    Decode { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(mappulse::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(mappulse::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: mappulse config init --profile {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(mappulse::config_exists),
        help("Pass --force to overwrite it, or edit it with `mappulse config set`.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(mappulse::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {reason}")]
    #[diagnostic(
        code(mappulse::keyring),
        help("Fall back to api_key_env or a plaintext api_key in the profile.")
    )]
    Keyring { reason: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {reason}")]
    #[diagnostic(code(mappulse::render))]
    Render { reason: String },
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Tls { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

/// What the CLI knows about the request when turning an API error into
/// a user-facing one.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub host: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl RequestContext {
    pub fn api_error(&self, err: mappulse_api::Error) -> CliError {
        use mappulse_api::Error as ApiError;

        if err.is_timeout() {
            return CliError::Timeout {
                seconds: self.timeout_secs,
            };
        }

        match err {
            ApiError::HttpStatus {
                status: status @ (401 | 403),
            } => CliError::AuthFailed {
                status,
                profile: self.profile.clone(),
            },
            ApiError::HttpStatus { status } => CliError::HttpStatus { status },
            ApiError::Decode {
                message,
                body_preview,
            } => {
                tracing::debug!(%body_preview, "undecodable response body");
                CliError::Decode { message }
            }
            ApiError::Tls(reason) => CliError::Tls { reason },
            ApiError::InvalidUrl { url, reason } => CliError::Validation {
                field: "base_url".into(),
                reason: format!("{url}: {reason}"),
            },
            ApiError::InvalidHeader { name, reason } => CliError::Validation {
                field: name,
                reason,
            },
            err @ ApiError::Transport(_) => CliError::ConnectionFailed {
                host: self.host.clone(),
                source: err,
            },
        }
    }

    pub fn core_error(&self, err: CoreError) -> CliError {
        match err {
            CoreError::Api(err) => self.api_error(err),
            CoreError::InvalidConfig { field, reason } => CliError::Validation {
                field: field.into(),
                reason,
            },
            CoreError::NoRuntime => CliError::Validation {
                field: "runtime".into(),
                reason: "no async runtime available".into(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::ProfileNotFound { name, available } => {
                Self::ProfileNotFound { name, available }
            }
            ConfigError::Serialization(e) => Self::Render {
                reason: e.to_string(),
            },
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Keyring(e) => Self::Keyring {
                reason: e.to_string(),
            },
            ConfigError::Io(e) => Self::Io(e),
        }
    }
}
