//! Error types shared by every GDA crate

use thiserror::Error;

/// Result type alias for GDA operations
pub type Result<T> = std::result::Result<T, GdaError>;

/// Base error type for GDA
#[derive(Error, Debug)]
pub enum GdaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GdaError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
