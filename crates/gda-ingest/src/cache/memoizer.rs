//! Memoization of slow acquisition calls

use super::key::CallSignature;
use super::payload::CachePayload;
use super::store::{Lookup, ResultStore};
use super::{CacheError, DEFAULT_FRESHNESS};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Runs a producer only when the store has no fresh result for the call
#[derive(Debug, Clone)]
pub struct Memoizer {
    store: ResultStore,
    freshness: Duration,
}

impl Memoizer {
    pub fn new(store: ResultStore) -> Self {
        Self {
            store,
            freshness: DEFAULT_FRESHNESS,
        }
    }

    /// Override the default freshness window used by [`Memoizer::fetch`]
    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// [`Memoizer::memoize`] with the configured freshness window
    pub async fn fetch<P, E, F, Fut>(&self, signature: &CallSignature, producer: F) -> Result<P, E>
    where
        P: CachePayload,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<P, E>>,
    {
        self.memoize(signature, self.freshness, producer).await
    }

    /// Return the stored result for `signature` if it is younger than
    /// `freshness`; otherwise run `producer`, persist what it returns and
    /// hand it back.
    ///
    /// A producer error is returned as-is and nothing is written.
    pub async fn memoize<P, E, F, Fut>(
        &self,
        signature: &CallSignature,
        freshness: Duration,
        producer: F,
    ) -> Result<P, E>
    where
        P: CachePayload,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<P, E>>,
    {
        let key = signature.key();
        let operation = signature.operation();

        match self.store.load::<P>(signature, freshness) {
            Lookup::Hit(payload) => {
                debug!(operation, key = %key, "Cache hit");
                return Ok(payload);
            },
            Lookup::Missing => debug!(operation, key = %key, "Cache miss"),
            Lookup::Stale { age } => {
                info!(operation, key = %key, age_hours = age.as_secs() / 3600, "Cache entry is stale")
            },
            Lookup::Corrupt { reason } => {
                warn!(operation, key = %key, reason = %reason, "Discarding unreadable cache entry")
            },
        }

        let payload = producer().await?;
        let path = self.store.save(signature, &payload)?;
        info!(operation, key = %key, path = %path.display(), "Cached result");

        Ok(payload)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::cache::{Json, Table};
    use std::cell::Cell;
    use tempfile::TempDir;

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("upstream unavailable")]
        Upstream,
        #[error(transparent)]
        Cache(#[from] CacheError),
    }

    fn backdate(path: &std::path::Path, by: Duration) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(std::time::SystemTime::now() - by).unwrap();
    }

    fn create_test_memoizer() -> (Memoizer, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::open(dir.path()).unwrap();
        (Memoizer::new(store), dir)
    }

    #[tokio::test]
    async fn test_second_call_uses_cache() {
        let (memo, _dir) = create_test_memoizer();
        let calls = Cell::new(0);
        let sig = CallSignature::new("get_hgnc_table");

        for _ in 0..2 {
            let table: Table = memo
                .fetch(&sig, || async {
                    calls.set(calls.get() + 1);
                    let mut table = Table::new(["hgnc_id", "symbol"]);
                    table.push_row(["HGNC:1100", "BRCA1"])?;
                    Ok::<_, TestError>(table)
                })
                .await
                .unwrap();
            assert_eq!(table.get(0, "symbol"), Some("BRCA1"));
        }

        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_reordered_kwargs_share_entry() {
        let (memo, _dir) = create_test_memoizer();
        let calls = Cell::new(0);
        let first = CallSignature::new("op").kwarg("a", 1).kwarg("b", 2);
        let second = CallSignature::new("op").kwarg("b", 2).kwarg("a", 1);

        for sig in [&first, &second] {
            let _: Json<u32> = memo
                .fetch(sig, || async {
                    calls.set(calls.get() + 1);
                    Ok::<_, TestError>(Json(7))
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_producer_error_is_not_cached() {
        let (memo, _dir) = create_test_memoizer();
        let sig = CallSignature::new("op");

        let result: Result<Json<u32>, TestError> =
            memo.fetch(&sig, || async { Err(TestError::Upstream) }).await;
        assert!(matches!(result, Err(TestError::Upstream)));
        assert!(memo.store().list().unwrap().is_empty());

        let value: Json<u32> = memo
            .fetch(&sig, || async { Ok::<_, TestError>(Json(3)) })
            .await
            .unwrap();
        assert_eq!(value.0, 3);
    }

    #[tokio::test]
    async fn test_zero_freshness_always_reruns_producer() {
        let (memo, _dir) = create_test_memoizer();
        let calls = Cell::new(0);
        let sig = CallSignature::new("op");

        for _ in 0..2 {
            let _: Json<u32> = memo
                .memoize(&sig, Duration::ZERO, || async {
                    calls.set(calls.get() + 1);
                    Ok::<_, TestError>(Json(calls.get()))
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_replaced() {
        let (memo, _dir) = create_test_memoizer();
        let sig = CallSignature::new("op");
        let path = memo
            .store()
            .entry_path(&sig, crate::cache::PayloadFormat::Structured);
        std::fs::write(&path, b"garbage").unwrap();

        let value: Json<Vec<u8>> = memo
            .fetch(&sig, || async { Ok::<_, TestError>(Json(vec![1, 2, 3])) })
            .await
            .unwrap();
        assert_eq!(value.0, vec![1, 2, 3]);

        let reread: Json<Vec<u8>> = memo
            .fetch(&sig, || async { Err::<Json<Vec<u8>>, _>(TestError::Upstream) })
            .await
            .unwrap();
        assert_eq!(reread.0, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_freshness_window_boundary() {
        let (memo, _dir) = create_test_memoizer();
        let window = Duration::from_secs(60);
        let sig = CallSignature::new("get_orphanet_table");
        let path = memo.store().entry_path(&sig, crate::cache::PayloadFormat::Structured);
        let counter = Cell::new(0);
        let calls = &counter;

        let run = move || async move {
            calls.set(calls.get() + 1);
            Ok::<_, TestError>(Json(calls.get()))
        };

        let _: Json<u32> = memo.memoize(&sig, window, run).await.unwrap();
        assert_eq!(calls.get(), 1);

        // One second inside the window: served from disk.
        backdate(&path, window - Duration::from_secs(1));
        let hit: Json<u32> = memo.memoize(&sig, window, run).await.unwrap();
        assert_eq!(hit.0, 1);
        assert_eq!(calls.get(), 1);

        // Exactly the window old: refetched even though the file exists.
        backdate(&path, window);
        assert!(path.exists());
        let refreshed: Json<u32> = memo.memoize(&sig, window, run).await.unwrap();
        assert_eq!(refreshed.0, 2);
        assert_eq!(calls.get(), 2);
    }
}
