//! Configuration for the mappulse CLI.
//!
//! TOML profiles, layered loading (defaults → file → `MAPPULSE_` env),
//! credential resolution (env var → keyring → plaintext), and
//! translation to the runtime [`Settings`] consumed by the API and core
//! crates. Neither of those crates reads files; they only see `Settings`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use mappulse_api::{DEFAULT_BASE_URL, TlsMode, TransportConfig};
use mappulse_core::{PollerConfig, ProjectionConfig};

/// Keyring service name; entries are keyed `<profile>/api-key`.
pub const KEYRING_SERVICE: &str = "mappulse";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found (available: {available})")]
    ProfileNotFound { name: String, available: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Copy with every plaintext API key masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for profile in copy.profiles.values_mut() {
            if profile.api_key.is_some() {
                profile.api_key = Some("********".into());
            }
        }
        copy
    }

    /// Comma-separated profile names, or `(none)`.
    pub fn profile_names(&self) -> String {
        if self.profiles.is_empty() {
            "(none)".into()
        } else {
            self.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Seconds between the end of one poll and the start of the next.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Throttle window for live updates, in milliseconds.
    #[serde(default = "default_throttle")]
    pub throttle_ms: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            poll_interval_secs: default_poll_interval(),
            throttle_ms: default_throttle(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_poll_interval() -> u64 {
    8
}
fn default_throttle() -> u64 {
    1000
}
fn default_timeout() -> u64 {
    30
}

/// A named tracker account.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Device endpoint; the public OneStep GPS endpoint when unset.
    pub base_url: Option<String>,

    /// API key (plaintext, prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// PEM bundle trusted in addition to the system roots.
    pub ca_cert: Option<PathBuf>,

    pub poll_interval_secs: Option<u64>,

    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "mappulse", "mappulse").map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("mappulse");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` layered over defaults, then `MAPPULSE_*` env vars.
///
/// Nested keys use a double underscore, e.g.
/// `MAPPULSE_DEFAULTS__POLL_INTERVAL_SECS=15`. A missing file is not an
/// error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MAPPULSE_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credentials ─────────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key"))
}

/// Resolve an API key from the credential chain (no CLI flag step).
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(env_name) = profile.api_key_env.as_deref() {
        if let Ok(val) = std::env::var(env_name) {
            debug!(profile = profile_name, source = "env", "API key resolved");
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(secret) = keyring_entry(profile_name).and_then(|entry| entry.get_password()) {
        debug!(profile = profile_name, source = "keyring", "API key resolved");
        return Ok(SecretString::from(secret));
    }

    // 3. Plaintext in config
    if let Some(key) = profile.api_key.as_deref() {
        debug!(profile = profile_name, source = "config", "API key resolved");
        return Ok(SecretString::from(key.to_owned()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store an API key in the system keyring for `profile_name`.
pub fn store_api_key(profile_name: &str, key: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(key.expose_secret())?;
    Ok(())
}

// ── Runtime settings ────────────────────────────────────────────────

/// Values given on the command line, which win over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
}

/// Everything needed to build a client, poller and projection.
#[derive(Debug)]
pub struct Settings {
    pub profile: String,
    pub base_url: String,
    pub api_key: SecretString,
    pub transport: TransportConfig,
    pub poller: PollerConfig,
    pub projection: ProjectionConfig,
}

/// Resolve the active profile name: explicit request, then the file's
/// `default_profile`, then `"default"`.
pub fn active_profile_name(config: &Config, requested: Option<&str>) -> String {
    requested
        .map(str::to_owned)
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build [`Settings`] from config plus command-line overrides.
///
/// An explicitly requested profile must exist. When the implicit default
/// profile is absent, an empty profile is used so that flags and env
/// vars alone are enough.
pub fn resolve_settings(config: &Config, overrides: &Overrides) -> Result<Settings, ConfigError> {
    let name = active_profile_name(config, overrides.profile.as_deref());

    let profile = match config.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None if overrides.profile.is_some() => {
            return Err(ConfigError::ProfileNotFound {
                name,
                available: config.profile_names(),
            });
        }
        None => Profile::default(),
    };

    let base_url = validate_base_url(
        overrides
            .base_url
            .as_deref()
            .or(profile.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL),
    )?;

    let api_key = match overrides.api_key.as_deref() {
        Some(key) if !key.is_empty() => SecretString::from(key.to_owned()),
        _ => resolve_api_key(&profile, &name)?,
    };

    let timeout = positive(
        "timeout",
        overrides
            .timeout_secs
            .or(profile.timeout)
            .unwrap_or(config.defaults.timeout),
    )?;
    let tls = profile
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);

    let interval = positive(
        "poll_interval_secs",
        overrides
            .poll_interval_secs
            .or(profile.poll_interval_secs)
            .unwrap_or(config.defaults.poll_interval_secs),
    )?;
    let poller = PollerConfig::new(Duration::from_secs(interval)).map_err(|e| {
        ConfigError::Validation {
            field: "poll_interval_secs".into(),
            reason: e.to_string(),
        }
    })?;

    let projection = ProjectionConfig::new(Duration::from_millis(config.defaults.throttle_ms))
        .map_err(|e| ConfigError::Validation {
            field: "throttle_ms".into(),
            reason: e.to_string(),
        })?;

    Ok(Settings {
        profile: name,
        base_url,
        api_key,
        transport: TransportConfig {
            tls,
            timeout: Duration::from_secs(timeout),
        },
        poller,
        projection,
    })
}

fn positive(field: &str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(value)
}

/// Check that `raw` is an absolute http(s) URL.
pub fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "base_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(raw.to_owned())
}
