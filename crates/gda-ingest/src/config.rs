//! Acquisition configuration
//!
//! Defaults, overridable through `GDA_*` environment variables or the
//! builder.

use gda_common::{GdaError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default MONDO ontology download location
pub const DEFAULT_MONDO_OBO_URL: &str = "https://purl.obolibrary.org/obo/mondo.obo";

/// Cache directory name under the user's home directory
const CACHE_DIR_NAME: &str = ".annotations";

const DEFAULT_FRESHNESS_DAYS: u64 = 7;
const DEFAULT_TIMEOUT_SECS: u64 = 600;
const SECS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Root of the result cache
    pub cache_dir: PathBuf,

    /// Cached results older than this many days are refetched
    pub freshness_days: u64,

    /// Per-request HTTP timeout
    pub timeout_secs: u64,

    /// Attempts per download; only transient failures are retried
    pub max_attempts: u32,

    pub mondo_obo_url: String,

    /// Expected SHA-256 of the MONDO download, when pinning a release
    pub mondo_obo_sha256: Option<String>,

    /// Stop parsing after this many terms (sample runs)
    pub parse_limit: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let cache_dir = dirs::home_dir()
            .map(|home| home.join(CACHE_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(CACHE_DIR_NAME));

        Self {
            cache_dir,
            freshness_days: DEFAULT_FRESHNESS_DAYS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: 1,
            mondo_obo_url: DEFAULT_MONDO_OBO_URL.to_string(),
            mondo_obo_sha256: None,
            parse_limit: None,
        }
    }
}

impl IngestConfig {
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Defaults overridden by environment variables
    ///
    /// - `GDA_CACHE_DIR`
    /// - `GDA_CACHE_TTL_DAYS`
    /// - `GDA_HTTP_TIMEOUT_SECS`
    /// - `GDA_HTTP_MAX_ATTEMPTS`
    /// - `GDA_MONDO_OBO_URL`
    /// - `GDA_MONDO_OBO_SHA256`
    /// - `GDA_PARSE_LIMIT`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("GDA_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(days) = parse_env("GDA_CACHE_TTL_DAYS")? {
            config.freshness_days = days;
        }
        if let Some(secs) = parse_env("GDA_HTTP_TIMEOUT_SECS")? {
            config.timeout_secs = secs;
        }
        if let Some(attempts) = parse_env("GDA_HTTP_MAX_ATTEMPTS")? {
            config.max_attempts = attempts;
        }
        if let Ok(url) = std::env::var("GDA_MONDO_OBO_URL") {
            config.mondo_obo_url = url;
        }
        if let Ok(sha) = std::env::var("GDA_MONDO_OBO_SHA256") {
            config.mondo_obo_sha256 = Some(sha);
        }
        if let Some(limit) = parse_env("GDA_PARSE_LIMIT")? {
            config.parse_limit = Some(limit);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(GdaError::config("Cache directory cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(GdaError::config("Timeout must be greater than 0"));
        }
        if self.max_attempts == 0 {
            return Err(GdaError::config("Max attempts must be at least 1"));
        }
        if self.mondo_obo_url.is_empty() {
            return Err(GdaError::config("MONDO OBO URL cannot be empty"));
        }
        Ok(())
    }

    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.freshness_days.saturating_mul(SECS_PER_DAY))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| GdaError::config(format!("{name} has an invalid value: {raw}"))),
        Err(_) => Ok(None),
    }
}

/// Builder for [`IngestConfig`]
#[derive(Debug, Default)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = dir.into();
        self
    }

    pub fn freshness_days(mut self, days: u64) -> Self {
        self.config.freshness_days = days;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn mondo_obo_url(mut self, url: impl Into<String>) -> Self {
        self.config.mondo_obo_url = url.into();
        self
    }

    pub fn mondo_obo_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.config.mondo_obo_sha256 = Some(sha256.into());
        self
    }

    pub fn parse_limit(mut self, limit: usize) -> Self {
        self.config.parse_limit = Some(limit);
        self
    }

    pub fn build(self) -> IngestConfig {
        self.config
    }
}
