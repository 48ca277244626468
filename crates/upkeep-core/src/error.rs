//! Error types for Upkeep.

use thiserror::Error;

/// Result type alias using Upkeep's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Upkeep operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Storage medium operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Storage medium is out of capacity (quota exceeded)
    #[error("Storage full: {0}")]
    StorageFull(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
