//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Password, Select};
use serde_json::Value;

use kampus_core::{EntityKind, FetchOrdering, OnExhausted};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking the plaintext API key.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    for name in sorted_names(cfg) {
        let p = &cfg.profiles[&name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "url = \"{}\"", p.url);
        let _ = writeln!(out, "bucket = \"{}\"", p.bucket);
        if p.api_key.is_some() {
            let _ = writeln!(out, "api_key = \"{MASK}\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(ordering) = p.fetch_ordering {
            let _ = writeln!(out, "fetch_ordering = \"{ordering}\"");
        }

        let retry = &p.view_retry;
        let mut retry_lines = Vec::new();
        if let Some(n) = retry.max_attempts {
            retry_lines.push(format!("max_attempts = {n}"));
        }
        if let Some(ms) = retry.initial_backoff_ms {
            retry_lines.push(format!("initial_backoff_ms = {ms}"));
        }
        if let Some(ms) = retry.max_backoff_ms {
            retry_lines.push(format!("max_backoff_ms = {ms}"));
        }
        if let Some(policy) = retry.on_exhausted {
            retry_lines.push(format!("on_exhausted = \"{policy}\""));
        }
        if !retry_lines.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "[profiles.{name}.view_retry]");
            for line in retry_lines {
                let _ = writeln!(out, "{line}");
            }
        }

        if !p.collections.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "[profiles.{name}.collections]");
            let mut kinds: Vec<_> = p.collections.iter().collect();
            kinds.sort();
            for (kind, collection) in kinds {
                let _ = writeln!(out, "{kind} = \"{collection}\"");
            }
        }
    }

    out.trim_end().to_owned()
}

/// Serialized config with every plaintext API key replaced by the mask.
fn redacted_value(cfg: &Config) -> Result<Value, CliError> {
    let mut value = serde_json::to_value(cfg)?;
    if let Some(profiles) = value.get_mut("profiles").and_then(Value::as_object_mut) {
        for profile in profiles.values_mut() {
            if let Some(key) = profile.get_mut("api_key").filter(|k| !k.is_null()) {
                *key = Value::String(MASK.into());
            }
        }
    }
    Ok(value)
}

fn sorted_names(cfg: &Config) -> Vec<String> {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    names.sort();
    names
}

fn profile_not_found(name: String, cfg: &Config) -> CliError {
    let names = sorted_names(cfg);
    CliError::ProfileNotFound {
        name,
        available: if names.is_empty() {
            "(none)".into()
        } else {
            names.join(", ")
        },
    }
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_api_key() -> Result<String, CliError> {
    let key = Password::new()
        .with_prompt("API key")
        .interact()
        .map_err(prompt_err)?;
    if key.trim().is_empty() {
        return Err(CliError::Validation {
            field: "api_key".into(),
            reason: "API key cannot be empty".into(),
        });
    }
    Ok(key)
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str, expect: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expect}, got '{value}'"),
    })
}

/// Apply `config set <key> <value>` to one profile.
fn set_profile_value(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    let normalized = key.replace('-', "_");
    match normalized.as_str() {
        "url" => profile.url = value,
        "bucket" => profile.bucket = value,
        "api_key" => profile.api_key = Some(value),
        "api_key_env" => profile.api_key_env = Some(value),
        "ca_cert" => profile.ca_cert = Some(value.into()),
        "timeout" => profile.timeout = Some(parse_field(key, &value, "a number (seconds)")?),
        "fetch_ordering" => {
            profile.fetch_ordering = Some(parse_field::<FetchOrdering>(
                key,
                &value,
                "'latest-issued' or 'last-resolved'",
            )?);
        }
        "view_retry.max_attempts" => {
            profile.view_retry.max_attempts = Some(parse_field(key, &value, "a positive number")?);
        }
        "view_retry.initial_backoff_ms" => {
            profile.view_retry.initial_backoff_ms =
                Some(parse_field(key, &value, "a number (milliseconds)")?);
        }
        "view_retry.max_backoff_ms" => {
            profile.view_retry.max_backoff_ms =
                Some(parse_field(key, &value, "a number (milliseconds)")?);
        }
        "view_retry.on_exhausted" => {
            profile.view_retry.on_exhausted = Some(parse_field::<OnExhausted>(
                key,
                &value,
                "'rollback' or 'keep-local'",
            )?);
        }
        other => match other.strip_prefix("collections.") {
            Some(kind) => {
                let kind: EntityKind = parse_field(key, kind, "an entity kind such as 'news'")?;
                profile.collections.insert(kind.to_string(), value);
            }
            None => {
                return Err(CliError::Validation {
                    field: key.into(),
                    reason: format!(
                        "unknown config key '{key}'. Valid keys: url, bucket, api_key, \
                         api_key_env, ca_cert, timeout, fetch_ordering, view_retry.<field>, \
                         collections.<kind>"
                    ),
                });
            }
        },
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("kampus configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let url: String = Input::new()
                .with_prompt("Project URL")
                .interact_text()
                .map_err(prompt_err)?;

            let key = prompt_api_key()?;
            let choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let selection = Select::new()
                .with_prompt("Where to store the API key?")
                .items(choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;
            let api_key = if selection == 0 {
                kampus_config::store_api_key(&profile_name, &key)?;
                eprintln!("   ✓ API key stored in system keyring");
                None
            } else {
                Some(key)
            };

            let bucket: String = Input::new()
                .with_prompt("Storage bucket")
                .default("media".into())
                .interact_text()
                .map_err(prompt_err)?;

            let mut profile = Profile::new(url);
            profile.api_key = api_key;
            profile.bucket = bucket;
            kampus_config::profile_url(&profile)?;

            let mut cfg = config::load_config().unwrap_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: kampus news list");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => format_config_redacted(&cfg),
                ref structured => output::render_structured(structured, &redacted_value(&cfg)?)?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg
                .profiles
                .entry(profile_name.clone())
                .or_insert_with(|| Profile::new(String::new()));
            set_profile_value(profile, &key, value)?;

            config::save_config(&cfg)?;
            output::success(global, &format!("Set {key} on profile '{profile_name}'"));
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: kampus config init");
            } else {
                for name in sorted_names(&cfg) {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(name, &cfg));
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            output::success(global, &format!("Default profile set to '{name}'"));
            Ok(())
        }

        // ── SetKey ──────────────────────────────────────────────────
        ConfigCommand::SetKey => {
            let cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(profile_not_found(profile_name, &cfg));
            }
            let key = prompt_api_key()?;
            kampus_config::store_api_key(&profile_name, &key)?;
            output::success(
                global,
                &format!("API key stored in system keyring for profile '{profile_name}'"),
            );
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
    }
}
