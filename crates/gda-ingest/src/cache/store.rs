//! Disk-backed store of cache entries
//!
//! One gzip file per (operation, key) pair lives directly under the root
//! directory. Writes go to a temporary file in the same directory and are
//! renamed into place only after the payload has been fully written and
//! synced, so a reader never observes a partial entry.

use super::key::{sanitize_operation, CacheKey, CallSignature};
use super::payload::{CachePayload, PayloadFormat};
use super::Result;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;
use tracing::debug;

/// Outcome of looking up one entry
#[derive(Debug)]
pub enum Lookup<P> {
    /// Entry exists, is younger than the freshness window and decoded cleanly
    Hit(P),
    /// Entry exists but is too old
    Stale { age: Duration },
    /// No entry on disk
    Missing,
    /// Entry exists but could not be read back
    Corrupt { reason: String },
}

impl<P> Lookup<P> {
    pub fn into_hit(self) -> Option<P> {
        match self {
            Lookup::Hit(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }
}

/// Metadata about a stored entry, as found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: CacheKey,
    /// Sanitized operation name taken from the file name
    pub operation: String,
    pub format: PayloadFormat,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

impl CacheEntry {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_fresh(&self, freshness: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < freshness
    }
}

/// Handle on a cache root directory
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "Opened result store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<operation>.<key>.<ext>`
    pub fn entry_path(&self, signature: &CallSignature, format: PayloadFormat) -> PathBuf {
        self.root.join(format!(
            "{}.{}.{}",
            signature.file_stem(),
            signature.key(),
            format.extension()
        ))
    }

    /// Look up the entry for `signature`, treating anything at least
    /// `freshness` old as stale
    pub fn load<P: CachePayload>(&self, signature: &CallSignature, freshness: Duration) -> Lookup<P> {
        let path = self.entry_path(signature, P::FORMAT);

        let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => return Lookup::Missing,
        };

        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age >= freshness {
            return Lookup::Stale { age };
        }

        match Self::read_payload(&path) {
            Ok(payload) => Lookup::Hit(payload),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Cache entry could not be decoded");
                Lookup::Corrupt {
                    reason: e.to_string(),
                }
            },
        }
    }

    fn read_payload<P: CachePayload>(path: &Path) -> Result<P> {
        let file = fs::File::open(path)?;
        P::decode(GzDecoder::new(BufReader::new(file)))
    }

    /// Persist `payload`, replacing any previous entry for the same signature
    pub fn save<P: CachePayload>(&self, signature: &CallSignature, payload: &P) -> Result<PathBuf> {
        let path = self.entry_path(signature, P::FORMAT);

        // Dropped (and deleted) on any early return below.
        let mut staging = NamedTempFile::new_in(&self.root)?;
        {
            let mut encoder =
                GzEncoder::new(BufWriter::new(staging.as_file_mut()), Compression::default());
            payload.encode(&mut encoder)?;
            encoder.finish()?.flush()?;
        }
        staging.as_file().sync_all()?;
        staging.persist(&path).map_err(|e| e.error)?;

        debug!(path = %path.display(), format = %P::FORMAT, "Stored cache entry");
        Ok(path)
    }

    /// Delete the entry for `signature`; returns whether one existed
    pub fn remove(&self, signature: &CallSignature, format: PayloadFormat) -> Result<bool> {
        let path = self.entry_path(signature, format);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// All well-formed entries under the root, newest first
    pub fn list(&self) -> Result<Vec<CacheEntry>> {
        let mut entries = Vec::new();

        for dir_entry in fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            let metadata = dir_entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            let file_name = dir_entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some((stem, format)) = PayloadFormat::split_file_name(name) else {
                continue;
            };
            let Some((operation, key)) = stem.rsplit_once('.') else {
                continue;
            };
            let Some(key) = CacheKey::parse(key) else {
                continue;
            };
            if operation.is_empty() || sanitize_operation(operation) != operation {
                continue;
            }

            entries.push(CacheEntry {
                key,
                operation: operation.to_string(),
                format,
                created_at: DateTime::<Utc>::from(metadata.modified()?),
                size_bytes: metadata.len(),
                path: dir_entry.path(),
            });
        }

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    /// Remove every entry; unrelated files in the root are left alone
    pub fn clear(&self) -> Result<usize> {
        let entries = self.list()?;
        let count = entries.len();
        for entry in entries {
            fs::remove_file(&entry.path)?;
        }
        debug!(root = %self.root.display(), count, "Cleared result store");
        Ok(count)
    }
}
