//! Error types for tempdrop.

use thiserror::Error;

/// Common error type for tempdrop.
#[derive(Error, Debug)]
pub enum TempdropError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for client input (e.g. no file attached).
    #[error("validation error: {0}")]
    Validation(String),

    /// Upload exceeded the configured size limit.
    #[error("file too large (max {limit} bytes)")]
    TooLarge {
        /// Limit in bytes.
        limit: u64,
    },

    /// Resource not found (unknown or expired id, missing blob).
    #[error("{0} not found")]
    NotFound(String),

    /// Failed to write an uploaded blob.
    #[error("storage write error: {0}")]
    StorageWrite(String),

    /// Failed to read a stored blob.
    #[error("storage read error: {0}")]
    StorageRead(String),

    /// The metadata snapshot could not be read or parsed.
    #[error("metadata corrupt: {0}")]
    MetadataCorrupt(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The upstream hosting API failed.
    #[error("upstream error: {0}")]
    Upstream(String),
}

/// Result type alias for tempdrop operations.
pub type Result<T> = std::result::Result<T, TempdropError>;
