// ── Core error types ──
//
// Errors surfaced by store writes and registry accessors. Consumers never
// see HTTP details directly: the `From<kampus_api::Error>` impl translates
// gateway failures into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the data service: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Data service unavailable: {message}")]
    Unavailable { message: String },

    /// `timeout_secs` is `None` when the client's limit is not known.
    #[error("Request timed out{}", .timeout_secs.map(|s| format!(" after {s}s")).unwrap_or_default())]
    Timeout { timeout_secs: Option<u64> },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_type} with key {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    /// Integrity constraint rejected by the service (SQLSTATE class 23),
    /// e.g. a new content section written without a title.
    #[error("Constraint violation ({code}): {message}")]
    ConstraintViolation {
        message: String,
        code: String,
        hint: Option<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    // ── Gateway errors (wrapped, not exposed raw) ────────────────────
    #[error("Remote error: {message}")]
    Remote {
        message: String,
        code: Option<String>,
        status: Option<u16>,
    },

    #[error("Storage error: {message}")]
    Storage { message: String, status: u16 },

    // ── Lifecycle errors ─────────────────────────────────────────────
    /// A store accessor was used after the registry that owns the store
    /// was shut down or dropped.
    #[error("{store} store accessed outside of its registry")]
    OutsideRegistry { store: &'static str },

    #[error("Operation cancelled")]
    Cancelled,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Unavailable { .. } | Self::Timeout { .. } => true,
            Self::Remote {
                status: Some(status),
                ..
            }
            | Self::Storage { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

// ── Conversion from gateway errors ───────────────────────────────────

impl From<kampus_api::Error> for CoreError {
    fn from(err: kampus_api::Error) -> Self {
        match err {
            kampus_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            kampus_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: None }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Remote {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            kampus_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            kampus_api::Error::Timeout { timeout_secs } => CoreError::Timeout {
                timeout_secs: Some(timeout_secs),
            },
            kampus_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                reason: format!("TLS error: {msg}"),
            },
            kampus_api::Error::Unavailable(message) => CoreError::Unavailable { message },
            kampus_api::Error::Remote {
                message,
                code: Some(code),
                hint,
                ..
            } if code.starts_with("23") => CoreError::ConstraintViolation {
                message,
                code,
                hint,
            },
            kampus_api::Error::Remote {
                message,
                code,
                status,
                ..
            } => CoreError::Remote {
                message,
                code,
                status: Some(status),
            },
            kampus_api::Error::Storage { message, status } => CoreError::Storage { message, status },
            kampus_api::Error::Deserialization { message, body: _ } => CoreError::Serialization {
                message: format!("Unreadable response: {message}"),
            },
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization {
            message: err.to_string(),
        }
    }
}
