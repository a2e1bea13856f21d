//! Config subcommand handlers.

use std::collections::BTreeMap;
use std::io::BufRead;

use secrecy::SecretString;

use mappulse_config::{self as config, Config, Defaults, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Painter};

fn parse_secs(field: &str, value: &str) -> Result<u64, CliError> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(CliError::Validation {
            field: field.into(),
            reason: "must be a positive number of seconds".into(),
        }),
    }
}

fn notice(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{}", Painter::new(global.color).ok(message));
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init ────────────────────────────────────────────────────
        ConfigCommand::Init { api_key_env, force } => {
            let path = config::config_path();
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let profile_name = global.profile.clone().unwrap_or_else(|| "default".into());
            let base_url = global
                .base_url
                .as_deref()
                .map(config::validate_base_url)
                .transpose()?;

            if let Some(key) = global.api_key.as_deref().filter(|k| !k.is_empty()) {
                config::store_api_key(&profile_name, &SecretString::from(key.to_owned()))?;
                notice(global, "✓ API key stored in system keyring");
            }

            let cfg = Config {
                default_profile: Some(profile_name.clone()),
                defaults: Defaults::default(),
                profiles: BTreeMap::from([(
                    profile_name.clone(),
                    Profile {
                        base_url,
                        api_key_env,
                        ..Profile::default()
                    },
                )]),
            };
            config::save_config_to(&cfg, &path)?;

            notice(
                global,
                &format!("✓ Configuration written to {}", path.display()),
            );
            notice(global, &format!("  Active profile: {profile_name}"));
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?.redacted();
            let out = output::render_single(
                global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|_| format!("{c:#?}")),
                |_| config::config_path().display().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(&cfg, global.profile.as_deref());
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            match key.as_str() {
                "base_url" | "base-url" => {
                    profile.base_url = Some(config::validate_base_url(&value)?);
                }
                "api_key" | "api-key" => profile.api_key = Some(value),
                "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
                "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
                "poll_interval_secs" | "poll-interval" | "interval" => {
                    profile.poll_interval_secs = Some(parse_secs("poll_interval_secs", &value)?);
                }
                "timeout" => profile.timeout = Some(parse_secs("timeout", &value)?),
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: base_url, api_key, \
                             api_key_env, ca_cert, poll_interval_secs, timeout"
                        ),
                    });
                }
            }

            config::save_config(&cfg)?;
            notice(global, &format!("✓ Set {key} on profile '{profile_name}'"));
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                notice(global, "No profiles configured. Run: mappulse config init");
            } else {
                let listing = cfg
                    .profiles
                    .keys()
                    .map(|name| {
                        let marker = if name == default { " *" } else { "" };
                        format!("{name}{marker}")
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                output::print_output(&listing, global.quiet);
            }
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: cfg.profile_names(),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            notice(global, &format!("✓ Default profile set to '{name}'"));
            Ok(())
        }

        // ── SetKey ──────────────────────────────────────────────────
        ConfigCommand::SetKey => {
            let cfg = config::load_config()?;
            let profile_name = config::active_profile_name(&cfg, global.profile.as_deref());

            let key = match global.api_key.clone() {
                Some(key) => key,
                None => {
                    let mut line = String::new();
                    std::io::stdin().lock().read_line(&mut line)?;
                    line.trim().to_owned()
                }
            };
            if key.is_empty() {
                return Err(CliError::Validation {
                    field: "api_key".into(),
                    reason: "value cannot be empty".into(),
                });
            }

            config::store_api_key(&profile_name, &SecretString::from(key))?;
            notice(
                global,
                &format!("✓ API key stored in system keyring for profile '{profile_name}'"),
            );
            Ok(())
        }
    }
}
