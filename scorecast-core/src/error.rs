//! Error types for scorecast-core

use thiserror::Error;

/// Main error type for the scorecast-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Game source (HTTP/API) error
    #[error("game source error: {0}")]
    Source(String),
}

/// Result type alias for scorecast-core
pub type Result<T> = std::result::Result<T, Error>;
