//! Content-addressed result cache
//!
//! Acquisition routines wrap their slow network work in
//! [`Memoizer::fetch`]. The call is identified by a [`CallSignature`]
//! (operation name, positional arguments, keyword arguments); its short
//! SHA-256 digest names a gzip file under the [`ResultStore`] root. Entries
//! younger than the freshness window are decoded and returned without
//! running the producer.
//!
//! ```text
//! ~/.annotations/
//!   hgnc_table.3f9a0c1d2e.tsv.gz
//!   download_mondo_obo_file.a1b2c3d4e5.json.gz
//! ```

pub mod key;
pub mod memoizer;
pub mod payload;
pub mod store;

pub use key::{CacheKey, CallSignature, KEY_HEX_LEN};
pub use memoizer::Memoizer;
pub use payload::{CachePayload, Json, PayloadFormat, Table};
pub use store::{CacheEntry, Lookup, ResultStore};

use std::time::Duration;

/// Entries older than this are refetched
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Error types for the result cache
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache table error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {row} has {actual} fields, table has {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
}
