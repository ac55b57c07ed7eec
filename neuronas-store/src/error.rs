//! Error types for neuronas-store.

use thiserror::Error;

/// Result type alias using neuronas-store's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during storage operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Table name outside the whitelist
    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    /// Unknown tier name
    #[error("Invalid tier: {0}")]
    InvalidTier(String),

    /// Importance score outside [0, 1] or not finite
    #[error("Invalid importance score: {0}")]
    InvalidImportance(f64),

    /// Backing store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Compression or decompression failed
    #[error("Compression error ({codec}): {message}")]
    Compression { codec: String, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a compression error.
    pub fn compression(codec: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Compression {
            codec: codec.into(),
            message: message.into(),
        }
    }

    /// Whether this error was raised by input validation, before any I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidTable(_) | Self::InvalidTier(_) | Self::InvalidImportance(_)
        )
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}
