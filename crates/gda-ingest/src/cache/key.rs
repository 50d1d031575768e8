//! Deterministic identities for memoized calls

use gda_common::checksum::sha256_hex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Number of hex characters kept from the SHA-256 digest
pub const KEY_HEX_LEN: usize = 10;

/// Operation prefix dropped from cache file names
const OPERATION_PREFIX: &str = "get_";

/// Short content hash naming a cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accept an existing key, e.g. one parsed back out of a file name
    pub fn parse(value: &str) -> Option<Self> {
        (value.len() == KEY_HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit()))
            .then(|| Self(value.to_ascii_lowercase()))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A logical fetch operation together with its arguments
///
/// Keyword arguments live in a sorted map, so the order in which they are
/// supplied never changes the key:
///
/// ```
/// use gda_ingest::cache::CallSignature;
///
/// let a = CallSignature::new("get_panel_app_table").kwarg("region", "uk").kwarg("min_confidence", 3);
/// let b = CallSignature::new("get_panel_app_table").kwarg("min_confidence", 3).kwarg("region", "uk");
/// assert_eq!(a.key(), b.key());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignature {
    operation: String,
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
}

impl CallSignature {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword argument; a repeated name replaces the earlier value
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Canonical text form that gets hashed
    fn canonical(&self) -> String {
        let kwargs: Map<String, Value> = self
            .kwargs
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        format!("{} {} {}", self.operation, Value::Array(self.args.clone()), Value::Object(kwargs))
    }

    pub fn key(&self) -> CacheKey {
        let mut digest = sha256_hex(self.canonical().as_bytes());
        digest.truncate(KEY_HEX_LEN);
        CacheKey(digest)
    }

    /// File-name-safe form of the operation name
    pub fn file_stem(&self) -> String {
        sanitize_operation(&self.operation)
    }
}

/// Strip the `get_` prefix and replace anything outside `[A-Za-z0-9_-]`
pub(crate) fn sanitize_operation(operation: &str) -> String {
    let trimmed = operation.strip_prefix(OPERATION_PREFIX).unwrap_or(operation);
    let sanitized: String = trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "unnamed".to_string()
    } else {
        sanitized
    }
}
