//! Read-through response cache with TTL, a size bound, and in-flight dedup.
//!
//! Backed by `moka`: concurrent callers asking for the same key share a
//! single fetch, and a failed fetch stores nothing, so the next caller
//! retries.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

pub struct RequestCache<K, V> {
    inner: Cache<K, Arc<V>>,
}

impl<K, V> RequestCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let inner = Cache::builder()
            .max_capacity(u64::try_from(capacity).unwrap_or(u64::MAX))
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    /// Returns the cached value for `key` if present and fresh, without
    /// starting a fetch.
    pub async fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.inner.get(key).await
    }

    /// Returns the cached value for `key`, or runs `fetch` to produce it.
    ///
    /// # Errors
    ///
    /// Returns the error `fetch` produced, shared between every caller that
    /// was waiting on the same key. The error is not cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &K, fetch: F) -> Result<Arc<V>, Arc<E>>
    where
        K: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Send + Sync + 'static,
    {
        self.inner
            .try_get_with_by_ref(key, async move { fetch().await.map(Arc::new) })
            .await
    }
}
