//! GDA Ingest Library
//!
//! Acquisition of gene-disease annotation sources, with slow downloads and
//! derived tables memoized in an on-disk result cache.
//!
//! # Sources
//!
//! - **MONDO**: disease ontology, reduced to rare diseases and their top-level
//!   disease category
//!
//! # Example
//!
//! ```no_run
//! use gda_ingest::cache::{Memoizer, ResultStore};
//! use gda_ingest::config::IngestConfig;
//! use gda_ingest::mondo::MondoSource;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let memoizer = Memoizer::new(ResultStore::open(&config.cache_dir)?)
//!         .with_freshness(config.freshness());
//!
//!     let table = MondoSource::new(&config)?.rare_disease_table(&memoizer).await?;
//!     println!("{} rare diseases", table.len());
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod mondo;
pub mod ontology;

pub use cache::{CacheError, CallSignature, Memoizer, ResultStore, Table};
pub use config::IngestConfig;
pub use error::{IngestError, Result};
pub use fetch::{FetchError, HttpFetcher};
pub use mondo::MondoSource;
