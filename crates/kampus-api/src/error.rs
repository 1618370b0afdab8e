use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `kampus-api` crate.
///
/// Covers every failure mode of both gateways: transport, the PostgREST
/// error envelope, storage-object errors, and payload decoding.
/// `kampus-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// API key missing, expired, or rejected.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Service reachable in principle but refusing work (offline, 503).
    #[error("Remote service unavailable: {0}")]
    Unavailable(String),

    // ── Collection service ──────────────────────────────────────────
    /// Structured error from the collection service.
    ///
    /// `code` carries the SQLSTATE (e.g. `23502` for a not-null violation)
    /// or a `PGRST…` code when the failure happened before the database.
    #[error("Remote error (HTTP {status}): {message}")]
    Remote {
        message: String,
        code: Option<String>,
        status: u16,
        details: Option<String>,
        hint: Option<String>,
    },

    // ── Blob storage ────────────────────────────────────────────────
    /// Error returned by the storage service.
    #[error("Storage error (HTTP {status}): {message}")]
    Storage { message: String, status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Wrap a reqwest failure. A timeout names the configured limit when
    /// the client knows it.
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Option<Duration>) -> Self {
        match timeout {
            Some(limit) if err.is_timeout() => Self::Timeout {
                timeout_secs: limit.as_secs(),
            },
            _ => Self::Transport(err),
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::Unavailable(_) => true,
            Self::Remote { status, .. } | Self::Storage { status, .. } => {
                *status == 429 || *status >= 500
            }
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Remote { status: 404, .. } | Self::Storage { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Returns `true` for integrity constraint violations (SQLSTATE class 23):
    /// not-null, unique, foreign key, check.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Remote { code: Some(code), .. } if code.starts_with("23"))
    }

    /// Extract the remote error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Remote { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
