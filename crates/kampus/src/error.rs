//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use kampus_config::ConfigError;
use kampus_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the data service")]
    #[diagnostic(
        code(kampus::connection_failed),
        help(
            "Check the profile URL and your network.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Data service unavailable: {message}")]
    #[diagnostic(
        code(kampus::unavailable),
        help("The service is up but refused the request. Try again shortly.")
    )]
    Unavailable { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(kampus::auth_failed),
        help(
            "Verify the API key for this profile.\n\
             Run: kampus config set-key"
        )
    )]
    AuthFailed { message: String },

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(kampus::no_credentials),
        help(
            "Configure one with: kampus config init\n\
             Or pass --api-key / set KAMPUS_API_KEY."
        )
    )]
    NoCredentials { profile: String },

    // ── Records ──────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(kampus::not_found),
        help("Run: kampus {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("The service rejected the write ({code}): {message}")]
    #[diagnostic(code(kampus::constraint_violation), help("{help}"))]
    ConstraintViolation {
        code: String,
        message: String,
        help: String,
    },

    #[error("Service error: {message}")]
    #[diagnostic(code(kampus::api_error))]
    ApiError {
        message: String,
        code: Option<String>,
    },

    #[error("File storage error: {message}")]
    #[diagnostic(code(kampus::storage_error))]
    Storage { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(kampus::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(kampus::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: kampus config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No service configured")]
    #[diagnostic(
        code(kampus::no_config),
        help(
            "Create a profile with: kampus config init\n\
             Expected at: {path}\n\
             Or pass --url and --api-key."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(kampus::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(kampus::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Interrupted")]
    #[diagnostic(code(kampus::interrupted))]
    Interrupted,

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Request timed out")]
    #[diagnostic(
        code(kampus::timeout),
        help("Increase the timeout with --timeout or check the service.")
    )]
    Timeout,

    // ── Internal ─────────────────────────────────────────────────────

    #[error("{0}")]
    #[diagnostic(code(kampus::internal))]
    Internal(String),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(kampus::json), help("Check the JSON object and try again."))]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Unavailable { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::ConstraintViolation { .. } => exit_code::CONFLICT,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } | Self::Json(_) => {
                exit_code::USAGE
            }
            Self::Interrupted => exit_code::INTERRUPTED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed { reason },

            CoreError::Unavailable { message } => CliError::Unavailable { message },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout { .. } => CliError::Timeout,

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: format!("{entity_type} list"),
                resource_type: entity_type,
                identifier,
            },

            CoreError::ConstraintViolation {
                message,
                code,
                hint,
            } => {
                let help = match (code.as_str(), hint) {
                    ("23502", _) => "A required field is missing. New sections need --title.".into(),
                    ("23505", _) => "A record with the same unique value already exists.".into(),
                    (_, Some(hint)) => hint,
                    (_, None) => "Check the payload against the collection's constraints.".into(),
                };
                CliError::ConstraintViolation {
                    code,
                    message,
                    help,
                }
            }

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "payload".into(),
                reason: message,
            },

            CoreError::Serialization { message } => CliError::Internal(format!(
                "the service returned data this version cannot read: {message}"
            )),

            CoreError::Remote { message, code, .. } => CliError::ApiError { message, code },

            CoreError::Storage { message, .. } => CliError::Storage { message },

            CoreError::Cancelled => CliError::Interrupted,

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::OutsideRegistry { .. } | CoreError::Internal(_) => {
                CliError::Internal(err.to_string())
            }
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_title_maps_to_conflict_with_hint() {
        let err = CliError::from(CoreError::ConstraintViolation {
            message: "null value in column \"title\"".into(),
            code: "23502".into(),
            hint: None,
        });
        assert_eq!(err.exit_code(), exit_code::CONFLICT);
        let CliError::ConstraintViolation { help, .. } = err else {
            panic!("expected ConstraintViolation");
        };
        assert!(help.contains("--title"));
    }

    #[test]
    fn outside_registry_is_internal() {
        let err = CliError::from(CoreError::OutsideRegistry { store: "news" });
        assert_eq!(err.exit_code(), exit_code::GENERAL);
        assert!(err.to_string().contains("news"));
    }

    #[test]
    fn config_credentials_map_to_auth() {
        let err = CliError::from(ConfigError::NoCredentials {
            profile: "sekolah".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
