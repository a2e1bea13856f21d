#![allow(clippy::unwrap_used)]
// Loading, layering and settings resolution for mappulse-config.

use std::path::Path;
use std::time::Duration;

use figment::Jail;
use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;

use mappulse_api::{DEFAULT_BASE_URL, TlsMode};
use mappulse_config::{
    Config, ConfigError, Defaults, Overrides, Profile, load_config_from, resolve_api_key,
    resolve_settings, save_config_to,
};

// ── Helpers ─────────────────────────────────────────────────────────

const FLEET_TOML: &str = r#"
default_profile = "fleet"

[defaults]
poll_interval_secs = 15

[profiles.fleet]
base_url = "https://tracker.example.com/v3/api/public/device"
api_key = "plain-key"
timeout = 10

[profiles.lab]
base_url = "http://127.0.0.1:8080/device"
api_key = "lab-key"
poll_interval_secs = 2
ca_cert = "/etc/mappulse/lab-ca.pem"
"#;

fn fleet_config() -> Config {
    toml::from_str(FLEET_TOML).unwrap()
}

// ── Loading ─────────────────────────────────────────────────────────
//
// Loading reads `MAPPULSE_*` from the process environment, so these run
// inside a figment `Jail`, which serializes env access across tests.

#[test]
fn missing_file_yields_defaults() {
    Jail::expect_with(|_jail| {
        let cfg = load_config_from(Path::new("absent.toml")).unwrap();

        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults, Defaults::default());
        assert_eq!(cfg.defaults.poll_interval_secs, 8);
        assert_eq!(cfg.defaults.throttle_ms, 1000);
        assert_eq!(cfg.defaults.timeout, 30);
        assert!(cfg.profiles.is_empty());
        Ok(())
    });
}

#[test]
fn file_is_layered_over_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", FLEET_TOML)?;

        let cfg = load_config_from(Path::new("config.toml")).unwrap();

        assert_eq!(cfg.default_profile.as_deref(), Some("fleet"));
        assert_eq!(cfg.defaults.poll_interval_secs, 15);
        assert_eq!(cfg.defaults.throttle_ms, 1000, "unset keys keep defaults");
        assert_eq!(cfg.defaults.output, "table");
        assert_eq!(cfg.profiles.len(), 2);
        assert_eq!(cfg.profiles["fleet"].timeout, Some(10));
        Ok(())
    });
}

#[test]
fn env_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", FLEET_TOML)?;
        jail.set_env("MAPPULSE_DEFAULTS__TIMEOUT", "5");
        jail.set_env("MAPPULSE_DEFAULT_PROFILE", "lab");

        let cfg = load_config_from(Path::new("config.toml")).unwrap();
        assert_eq!(cfg.defaults.timeout, 5);
        assert_eq!(cfg.defaults.poll_interval_secs, 15);
        assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
        Ok(())
    });
}

#[test]
fn malformed_file_is_a_figment_error() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[defaults]\npoll_interval_secs = \"soon\"\n")?;

        assert!(matches!(
            load_config_from(Path::new("config.toml")),
            Err(ConfigError::Figment(_))
        ));
        Ok(())
    });
}

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let cfg = fleet_config();
    save_config_to(&cfg, &path).unwrap();

    Jail::expect_with(|_jail| {
        assert_eq!(load_config_from(&path).unwrap(), cfg);
        Ok(())
    });
}

#[test]
fn redacted_masks_plaintext_keys() {
    let shown = fleet_config().redacted();
    assert_eq!(shown.profiles["fleet"].api_key.as_deref(), Some("********"));
    assert_eq!(
        shown.profiles["fleet"].base_url,
        fleet_config().profiles["fleet"].base_url
    );
}

// ── Settings resolution ─────────────────────────────────────────────

#[test]
fn default_profile_settings() {
    let settings = resolve_settings(&fleet_config(), &Overrides::default()).unwrap();

    assert_eq!(settings.profile, "fleet");
    assert_eq!(
        settings.base_url,
        "https://tracker.example.com/v3/api/public/device"
    );
    assert_eq!(settings.api_key.expose_secret(), "plain-key");
    assert_eq!(settings.transport.timeout, Duration::from_secs(10));
    assert_eq!(settings.transport.tls, TlsMode::System);
    assert_eq!(settings.poller.interval(), Duration::from_secs(15));
    assert_eq!(settings.projection.window(), Duration::from_millis(1000));
}

#[test]
fn profile_specific_overrides() {
    let overrides = Overrides {
        profile: Some("lab".into()),
        ..Overrides::default()
    };
    let settings = resolve_settings(&fleet_config(), &overrides).unwrap();

    assert_eq!(settings.poller.interval(), Duration::from_secs(2));
    assert_eq!(settings.transport.timeout, Duration::from_secs(30));
    assert_eq!(
        settings.transport.tls,
        TlsMode::CustomCa("/etc/mappulse/lab-ca.pem".into())
    );
}

#[test]
fn flags_win_over_profile() {
    let overrides = Overrides {
        base_url: Some("http://localhost:9000/device".into()),
        api_key: Some("flag-key".into()),
        timeout_secs: Some(3),
        poll_interval_secs: Some(60),
        ..Overrides::default()
    };
    let settings = resolve_settings(&fleet_config(), &overrides).unwrap();

    assert_eq!(settings.base_url, "http://localhost:9000/device");
    assert_eq!(settings.api_key.expose_secret(), "flag-key");
    assert_eq!(settings.transport.timeout, Duration::from_secs(3));
    assert_eq!(settings.poller.interval(), Duration::from_secs(60));
}

#[test]
fn unknown_explicit_profile_is_rejected() {
    let overrides = Overrides {
        profile: Some("nope".into()),
        ..Overrides::default()
    };
    match resolve_settings(&fleet_config(), &overrides) {
        Err(ConfigError::ProfileNotFound { name, available }) => {
            assert_eq!(name, "nope");
            assert_eq!(available, "fleet, lab");
        }
        other => panic!("expected ProfileNotFound, got: {other:?}"),
    }
}

#[test]
fn flags_alone_are_enough_without_a_file() {
    let overrides = Overrides {
        api_key: Some("flag-key".into()),
        ..Overrides::default()
    };
    let settings = resolve_settings(&Config::default(), &overrides).unwrap();

    assert_eq!(settings.profile, "default");
    assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    assert_eq!(settings.poller.interval(), Duration::from_secs(8));
}

#[test]
fn zero_interval_is_a_validation_error() {
    let overrides = Overrides {
        poll_interval_secs: Some(0),
        ..Overrides::default()
    };
    assert!(matches!(
        resolve_settings(&fleet_config(), &overrides),
        Err(ConfigError::Validation { field, .. }) if field == "poll_interval_secs"
    ));
}

#[test]
fn non_http_base_url_is_rejected() {
    let overrides = Overrides {
        base_url: Some("ftp://tracker.example.com/device".into()),
        ..Overrides::default()
    };
    assert!(matches!(
        resolve_settings(&fleet_config(), &overrides),
        Err(ConfigError::Validation { field, .. }) if field == "base_url"
    ));
}

// ── Credential chain ────────────────────────────────────────────────

#[test]
fn api_key_env_wins_over_plaintext() {
    Jail::expect_with(|jail| {
        jail.set_env("MAPPULSE_TEST_FLEET_KEY", "from-env");
        let profile = Profile {
            api_key_env: Some("MAPPULSE_TEST_FLEET_KEY".into()),
            api_key: Some("plain".into()),
            ..Profile::default()
        };

        let key = resolve_api_key(&profile, "env-test-profile").unwrap();
        assert_eq!(key.expose_secret(), "from-env");
        Ok(())
    });
}

#[test]
fn missing_key_everywhere_is_no_credentials() {
    let profile = Profile {
        api_key_env: Some("MAPPULSE_TEST_UNSET_VARIABLE".into()),
        ..Profile::default()
    };
    assert!(matches!(
        resolve_api_key(&profile, "no-credentials-test-profile"),
        Err(ConfigError::NoCredentials { profile }) if profile == "no-credentials-test-profile"
    ));
}
