//! Common error types for the vessel-identification client

use thiserror::Error;

/// Common result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the client crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error (form snapshots, exports)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested field or catalog not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or snapshot content
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
