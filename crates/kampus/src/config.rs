//! Flag-aware configuration on top of `kampus-config`.
//!
//! Global flags (`--profile`, `--url`, `--api-key`, `--timeout`) override
//! what the profile says. The result is a `Connection`: everything needed to
//! build the gateways and the store registry.

use secrecy::SecretString;

use kampus_api::TransportConfig;
use kampus_core::RegistryConfig;

pub use kampus_config::{Config, Profile, config_path, load_config, save_config};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolved service connection for one invocation.
pub struct Connection {
    pub profile_name: String,
    pub url: String,
    pub api_key: SecretString,
    pub bucket: String,
    pub transport: TransportConfig,
    pub registry: RegistryConfig,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `Connection` from the config file, the active profile, and flags.
pub fn resolve_connection(global: &GlobalOpts) -> Result<Connection, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // An explicitly requested profile must exist.
        None if global.profile.is_some() => {
            let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
            names.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        // No profile: flags alone must describe the service.
        None => {
            let url = global.url.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile::new(url)
        }
    };

    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }

    let url = kampus_config::profile_url(&profile)?;
    let api_key = match global.api_key {
        Some(ref key) => SecretString::from(key.clone()),
        None => kampus_config::resolve_api_key(&profile, &profile_name)?,
    };

    Ok(Connection {
        url: url.to_string(),
        api_key,
        bucket: profile.bucket.clone(),
        transport: kampus_config::profile_to_transport(&profile, cfg.defaults.timeout),
        registry: kampus_config::profile_to_registry_config(&profile)?,
        profile_name,
    })
}
