//! Coalescing async cache.
//!
//! A TTL cache that also deduplicates concurrent in-flight resolutions for
//! the same key: while one caller is resolving, later callers await the same
//! pending result instead of issuing their own. Failures are never cached,
//! so the next caller retries.
//!
//! The permission resolver is the primary user; any remote-call site that
//! needs the same guarantee can reuse it instead of hand-rolling promise
//! bookkeeping.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

/// TTL cache with single-flight resolution per key.
pub struct CoalescingCache<K, V> {
    inner: Cache<K, V>,
}

impl<K, V> CoalescingCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache holding at most `max_capacity` entries, each expiring
    /// `ttl` after insertion.
    #[must_use]
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Return the cached value for `key`, or run `resolve` to produce it.
    ///
    /// Concurrent calls for the same key share one execution of `resolve`;
    /// all callers observe its result. A successful value is cached until
    /// the TTL expires. An error is returned to every waiting caller
    /// (wrapped in `Arc` because they share it) and nothing is cached.
    ///
    /// # Errors
    ///
    /// Propagates the error produced by `resolve`.
    pub async fn get_or_resolve<F, E>(&self, key: K, resolve: F) -> Result<V, Arc<E>>
    where
        F: Future<Output = Result<V, E>>,
        E: Send + Sync + 'static,
    {
        self.inner.try_get_with(key, resolve).await
    }

    /// Drop the entry for `key`, forcing the next call to re-resolve.
    pub async fn invalidate(&self, key: &K) {
        self.inner.invalidate(key).await;
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Whether a live entry exists for `key`.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }
}

impl<K, V> std::fmt::Debug for CoalescingCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoalescingCache")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_concurrent_callers_share_one_resolution() {
        let cache: CoalescingCache<String, u32> =
            CoalescingCache::new(16, Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let resolve = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, std::io::Error>(7)
        };

        let (a, b) = tokio::join!(
            cache.get_or_resolve("k".to_string(), resolve()),
            cache.get_or_resolve("k".to_string(), resolve()),
        );

        assert_eq!(a.unwrap(), 7);
        assert_eq!(b.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hit_within_ttl_skips_resolution() {
        let cache: CoalescingCache<String, u32> =
            CoalescingCache::new(16, Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_resolve("k".to_string(), async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, std::io::Error>(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache: CoalescingCache<String, u32> =
            CoalescingCache::new(16, Duration::from_millis(50));
        let calls = AtomicUsize::new(0);

        let resolve = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>(7)
        };

        cache
            .get_or_resolve("k".to_string(), resolve())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        cache
            .get_or_resolve("k".to_string(), resolve())
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache: CoalescingCache<String, u32> =
            CoalescingCache::new(16, Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let failed = cache
            .get_or_resolve("k".to_string(), async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(std::io::Error::other("boom"))
            })
            .await;
        assert!(failed.is_err());
        assert!(!cache.contains(&"k".to_string()));

        let value = cache
            .get_or_resolve("k".to_string(), async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, std::io::Error>(9)
            })
            .await
            .unwrap();

        assert_eq!(value, 9);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_re_resolution() {
        let cache: CoalescingCache<String, u32> =
            CoalescingCache::new(16, Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let resolve = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>(7)
        };

        cache
            .get_or_resolve("k".to_string(), resolve())
            .await
            .unwrap();
        cache.invalidate(&"k".to_string()).await;
        cache
            .get_or_resolve("k".to_string(), resolve())
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
