//! Error types and Result aliases for Lang-Monitor.
//!
//! The run is isolate-per-item: fetch, pattern and notification errors are
//! logged by the caller and never abort the pass. Only configuration and
//! state persistence failures surface from `App::run`.

use thiserror::Error;

/// Result type alias using Lang-Monitor's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Lang-Monitor operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Neither `monitors` nor `batch` declares anything to watch.
    #[error("no monitors configured")]
    NoMonitors,

    /// Remote directory request error.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Invalid glob or regex pattern.
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Notification channel error.
    #[error("notification error: {0}")]
    Notify(#[from] NotifyError),

    /// State persistence error.
    #[error("state error: {0}")]
    State(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors returned by the remote directory client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Repository, branch or path does not exist.
    #[error("repository or path not found")]
    NotFound,

    /// API rate limit hit or access forbidden.
    #[error("rate limited or access forbidden")]
    RateLimited,

    /// Transport failure (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// Anything else, including undecodable responses.
    #[error("{0}")]
    Unknown(String),
}

/// Invalid glob or regex pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid pattern '{pattern}': {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: String,
}

/// Notification channel errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Channel is partially configured.
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    /// A channel setting has an unusable value.
    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    /// SMTP or HTTP transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Remote API rejected the request.
    #[error("API error: {0}")]
    Api(String),

    /// Message could not be built (bad address, header).
    #[error("invalid message: {0}")]
    Message(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a state persistence error.
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl FetchError {
    /// Map a non-success HTTP status to the fetch taxonomy.
    #[must_use]
    pub fn from_status(code: u16, reason: &str) -> Self {
        match code {
            404 => Self::NotFound,
            403 | 429 => Self::RateLimited,
            _ => Self::Unknown(format!("HTTP {code}: {reason}")),
        }
    }
}

impl PatternError {
    /// Create a pattern error.
    pub fn new(pattern: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }
}
