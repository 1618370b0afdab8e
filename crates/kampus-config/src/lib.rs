//! Shared configuration for the kampus CLI and other consumers.
//!
//! TOML profiles, API key resolution (env + keyring + plaintext), and
//! translation of a profile into `kampus_core::RegistryConfig` and
//! `kampus_api::TransportConfig`. The CLI adds flag-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use kampus_api::{TlsMode, TransportConfig};
use kampus_core::{EntityKind, FetchOrdering, OnExhausted, RegistryConfig, RetryPolicy};

/// Keyring service name; entries are `<profile>/api-key`.
pub const KEYRING_SERVICE: &str = "kampus";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

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

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named service profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named service profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Project base URL (e.g., "https://abc.example.co").
    pub url: String,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Storage bucket holding uploaded images and documents.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// "latest-issued" (default) or "last-resolved".
    pub fetch_ordering: Option<FetchOrdering>,

    /// Retry schedule for view-count writes.
    #[serde(default)]
    pub view_retry: RetrySettings,

    /// Collection name overrides keyed by entity kind (e.g. `news = "berita"`).
    #[serde(default)]
    pub collections: HashMap<String, String>,
}

impl Profile {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            api_key_env: None,
            bucket: default_bucket(),
            ca_cert: None,
            timeout: None,
            fetch_ordering: None,
            view_retry: RetrySettings::default(),
            collections: HashMap::new(),
        }
    }
}

fn default_bucket() -> String {
    "media".into()
}

/// `[profiles.<name>.view_retry]` table. Unset fields use the core defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RetrySettings {
    pub max_attempts: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
    /// "rollback" (default) or "keep-local".
    pub on_exhausted: Option<OnExhausted>,
}

impl RetrySettings {
    pub fn to_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            initial_backoff: self
                .initial_backoff_ms
                .map_or(defaults.initial_backoff, Duration::from_millis),
            max_backoff: self
                .max_backoff_ms
                .map_or(defaults.max_backoff, Duration::from_millis),
            on_exhausted: self.on_exhausted.unwrap_or(defaults.on_exhausted),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
/// `KAMPUS_CONFIG` overrides it.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("KAMPUS_CONFIG") {
        return PathBuf::from(path);
    }
    ProjectDirs::from("id", "kampus", "kampus").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("kampus");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path`, overlaid with `KAMPUS_`-prefixed environment
/// variables (`__` separates nesting, e.g. `KAMPUS_DEFAULTS__OUTPUT`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("KAMPUS_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
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

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve an API key from the credential chain (no CLI flag step).
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store an API key for `profile_name` in the system keyring.
pub fn store_api_key(profile_name: &str, key: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(key)?;
    Ok(())
}

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key"))
}

// ── Translation to runtime config ───────────────────────────────────

/// Validate the profile URL.
pub fn profile_url(profile: &Profile) -> Result<url::Url, ConfigError> {
    profile.url.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {}", profile.url),
    })
}

/// Build the store registry configuration from a profile.
pub fn profile_to_registry_config(profile: &Profile) -> Result<RegistryConfig, ConfigError> {
    let mut collections = HashMap::new();
    for (kind, collection) in &profile.collections {
        let kind: EntityKind = kind.parse().map_err(|_| ConfigError::Validation {
            field: "collections".into(),
            reason: format!("unknown entity kind '{kind}'"),
        })?;
        if collection.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: format!("collections.{kind}"),
                reason: "collection name is empty".into(),
            });
        }
        collections.insert(kind, collection.clone());
    }

    Ok(RegistryConfig {
        collections,
        fetch_ordering: profile.fetch_ordering.unwrap_or_default(),
        view_retry: profile.view_retry.to_policy(),
    })
}

/// Build HTTP transport settings from a profile.
pub fn profile_to_transport(profile: &Profile, default_timeout: u64) -> TransportConfig {
    let tls = profile
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);
    TransportConfig {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(default_timeout)),
    }
}
