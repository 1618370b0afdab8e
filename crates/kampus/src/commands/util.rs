//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cli::{ListArgs, PayloadArgs};
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to ask on, a destructive action needs `--yes`.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

// ── Payloads ────────────────────────────────────────────────────────

/// Parse `--data` or `--from-file` into a draft or patch.
pub fn read_payload<T: DeserializeOwned>(args: &PayloadArgs) -> Result<T, CliError> {
    let value = match (&args.data, &args.from_file) {
        (Some(data), _) => parse_json(data, "data")?,
        (None, Some(path)) => read_json_file(path)?,
        (None, None) => {
            return Err(CliError::Validation {
                field: "data".into(),
                reason: "pass --data or --from-file".into(),
            });
        }
    };
    if !value.is_object() {
        return Err(CliError::Validation {
            field: "data".into(),
            reason: "expected a JSON object".into(),
        });
    }
    Ok(serde_json::from_value(value)?)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    parse_json(&contents, "from-file")
}

fn parse_json(text: &str, field: &str) -> Result<Value, CliError> {
    serde_json::from_str(text).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: format!("invalid JSON: {e}"),
    })
}

// ── List narrowing ──────────────────────────────────────────────────

/// Parse `--filter COLUMN=VALUE` pairs.
pub fn parse_filters(raw: &[String]) -> Result<Vec<(String, String)>, CliError> {
    raw.iter()
        .map(|f| match f.split_once('=') {
            Some((column, value)) if !column.trim().is_empty() => {
                Ok((column.trim().to_owned(), value.trim().to_owned()))
            }
            _ => Err(CliError::Validation {
                field: "filter".into(),
                reason: format!("expected COLUMN=VALUE, got '{f}'"),
            }),
        })
        .collect()
}

/// Whether the serialized form of `item` satisfies every filter.
///
/// Strings compare case-insensitively; other scalars compare by their JSON
/// text (`published=true`, `year=2024`).
pub fn matches_filters<T: Serialize>(item: &T, filters: &[(String, String)]) -> bool {
    if filters.is_empty() {
        return true;
    }
    let Ok(value) = serde_json::to_value(item) else {
        return false;
    };
    filters.iter().all(|(column, want)| match value.get(column) {
        Some(Value::String(s)) => s.eq_ignore_ascii_case(want),
        None | Some(Value::Null) => want.is_empty() || want == "null",
        Some(other) => other.to_string() == *want,
    })
}

/// Apply `--filter` and `--limit` to an already narrowed listing.
pub fn apply_list_args<E: Serialize>(
    items: Vec<Arc<E>>,
    list: &ListArgs,
) -> Result<Vec<Arc<E>>, CliError> {
    let filters = parse_filters(&list.filter)?;
    let limit = list.limit.unwrap_or(usize::MAX);
    Ok(items
        .into_iter()
        .filter(|item| matches_filters(item.as_ref(), &filters))
        .take(limit)
        .collect())
}
