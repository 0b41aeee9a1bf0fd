//! Error types for page image selection

use thiserror::Error;

/// Result type for page image operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the scoring, denylist and storage layers
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Broken deployment configuration. Never degraded to a default.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote fetch failed or returned a non-success status
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON encode/decode error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML config parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors that must abort the invocation rather than degrade a source
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Toml(_))
    }
}
