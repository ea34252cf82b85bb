// Error types for the admin console data layer.
// Covers upstream API failures, cache store failures, and classified loader errors.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication rejected ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Invalid configuration for {key}: {message}")]
    Config { key: String, message: String },

    #[error("No cache directory available on this platform")]
    NoCacheDir,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("{view} requires a super admin")]
    Forbidden { view: String },

    #[error("{}", .0.banner())]
    Load(LoadError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AdminError {
    /// Build an error from a non-success HTTP status and its response body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = server_message(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AdminError::Unauthorized {
                status: status.as_u16(),
                message,
            },
            _ => AdminError::Server {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// Pull the `error` or `message` field out of a JSON error body.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub type Result<T> = std::result::Result<T, AdminError>;

/// Classified loader failure.
///
/// Cloneable so a single in-flight request can hand the same outcome to
/// every caller waiting on it. Malformed responses and corrupt cache
/// entries never appear here: the former normalize to empty results and
/// the latter are treated as cache misses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication rejected ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("request cancelled")]
    Cancelled,
}

impl LoadError {
    /// Text suitable for a dismissible error banner.
    pub fn banner(&self) -> String {
        match self {
            LoadError::Network(_) => "Unable to reach the server. Check your connection and retry.".to_string(),
            LoadError::Auth { message, .. } => message.clone(),
            LoadError::Server { message, .. } => message.clone(),
            LoadError::Cancelled => String::new(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, LoadError::Cancelled)
    }
}

impl From<AdminError> for LoadError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Network(e) => LoadError::Network(e.to_string()),
            AdminError::Unauthorized { status, message } => LoadError::Auth { status, message },
            AdminError::NotSignedIn => LoadError::Auth {
                status: 401,
                message: "Not signed in".to_string(),
            },
            AdminError::Server { status, message } => LoadError::Server { status, message },
            AdminError::Load(e) => e,
            other => LoadError::Server {
                status: 0,
                message: other.to_string(),
            },
        }
    }
}
