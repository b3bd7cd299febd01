// src/error.rs

//! Unified error handling for the dorkdex application.

use thiserror::Error;

/// Result type alias for dorkdex operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Persisting store state failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Page source returned an unexpected response shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Transient network failure, eligible for retry
    #[error("Transient network error: {0}")]
    Transient(String),

    /// Query provider signalled throttling (e.g. HTTP 429)
    #[error("Rate limited by query provider; wait or change egress point")]
    RateLimited,

    /// Query provider did not respond within the timeout
    #[error("Query provider timed out; this may be transient")]
    Timeout,

    /// Opaque query provider error
    #[error("Query provider error: {0}")]
    Provider(String),
}

impl AppError {
    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create a transient network error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    /// Create a query provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    /// Whether a failed page request may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Http(_))
    }
}
