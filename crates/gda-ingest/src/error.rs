//! Error type for acquisition routines

use crate::cache::CacheError;
use crate::fetch::FetchError;
use gda_common::GdaError;
use thiserror::Error;

/// Result type alias for acquisition routines
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Common(#[from] GdaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
}

impl IngestError {
    /// Whether an orchestrator could reasonably retry the whole acquisition
    pub fn is_transient(&self) -> bool {
        matches!(self, IngestError::Fetch(e) if e.is_transient())
    }
}
