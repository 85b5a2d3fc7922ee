//! Memoizing Adapter
//!
//! Wraps one deterministic operation with its own [`TimedSizedCache`].
//!
//! The same engine serves both invocation strategies: [`Memoized::call`] runs a
//! synchronous computation, [`Memoized::call_async`] awaits an asynchronous one.
//! Neither adds any suspension of its own, and the cache lock is released while
//! the operation runs. Concurrent misses on the same key may therefore compute
//! the result more than once; the last result stored wins.

use std::future::Future;

use tracing::debug;

use crate::cache::{Admission, CacheStats, EstimateSize, KeyArg, TimedSizedCache};
use crate::config::CacheConfig;
use crate::error::Result;

// == Memoized ==
/// A wrapped operation's cache, created once per operation.
///
/// # Example
/// ```
/// use timed_sized_cache::{key_args, CacheConfig, Memoized};
///
/// let squares: Memoized<Vec<u64>> = Memoized::new("squares", CacheConfig::default());
/// let col = vec![1u64, 2, 3];
///
/// let first = squares.call(&key_args![col], || col.iter().map(|x| x * x).collect()).unwrap();
/// let second = squares.call(&key_args![col], || unreachable!("served from cache")).unwrap();
/// assert_eq!(first, second);
/// ```
#[derive(Debug)]
pub struct Memoized<V> {
    operation_name: String,
    cache: TimedSizedCache<V>,
}

impl<V> Memoized<V> {
    /// Creates the cache for `operation_name`.
    pub fn new(operation_name: impl Into<String>, config: CacheConfig) -> Self {
        let operation_name = operation_name.into();
        debug!(
            operation = operation_name.as_str(),
            capacity_bytes = config.capacity_bytes,
            ttl_secs = config.ttl.as_secs(),
            "Creating in-memory cache"
        );
        Self {
            operation_name,
            cache: TimedSizedCache::new(config),
        }
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    /// The underlying cache, for inspection.
    pub fn cache(&self) -> &TimedSizedCache<V> {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl<V: Clone + EstimateSize> Memoized<V> {
    // == Call ==
    /// Returns the cached result for `collections`, or runs `compute` and caches it.
    ///
    /// An unsupported argument fails before `compute` runs. A result too large
    /// to cache is still returned.
    pub fn call<F>(&self, collections: &[KeyArg], compute: F) -> Result<V>
    where
        F: FnOnce() -> V,
    {
        if let Some(cached) = self.lookup(collections)? {
            return Ok(cached);
        }
        let result = compute();
        self.store(collections, result)
    }

    // == Call Async ==
    /// Asynchronous counterpart of [`call`](Memoized::call); awaits `compute` on a miss.
    pub async fn call_async<F, Fut>(&self, collections: &[KeyArg], compute: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(cached) = self.lookup(collections)? {
            return Ok(cached);
        }
        let result = compute().await;
        self.store(collections, result)
    }

    fn lookup(&self, collections: &[KeyArg]) -> Result<Option<V>> {
        let cached = self.cache.get_item(&self.operation_name, collections)?;
        if cached.is_some() {
            debug!(operation = self.operation_name.as_str(), "Cache hit");
        }
        Ok(cached)
    }

    fn store(&self, collections: &[KeyArg], result: V) -> Result<V> {
        debug!(
            operation = self.operation_name.as_str(),
            "Cache miss, caching result"
        );
        let admission = self
            .cache
            .set_item(&self.operation_name, result.clone(), collections)?;
        if let Admission::TooLarge { size_bytes, .. } = admission {
            debug!(
                operation = self.operation_name.as_str(),
                size_bytes, "Result returned uncached"
            );
        }
        Ok(result)
    }
}
