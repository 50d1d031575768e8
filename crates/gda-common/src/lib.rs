//! GDA Common Library
//!
//! Shared utilities for the gene-disease annotation workspace.
//!
//! - **Error Handling**: [`GdaError`] and the [`Result`] alias
//! - **Checksums**: SHA-256 hex digests used for content addressing
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//!
//! # Example
//!
//! ```no_run
//! use gda_common::checksum::sha256_hex;
//!
//! let digest = sha256_hex(b"get_hgnc_table ()");
//! assert_eq!(digest.len(), 64);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod checksum;
pub mod error;
pub mod logging;

pub use error::{GdaError, Result};
