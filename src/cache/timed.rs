//! Timed Sized Cache Module
//!
//! Thread-safe cache addressed by operation name and argument collections.
//!
//! One lock guards the whole store and is held for the duration of each
//! `get_item`, `set_item` and `evict` call, so occupancy accounting and
//! eviction never interleave. The lock is never held while a wrapped
//! operation runs.

use parking_lot::Mutex;

use crate::cache::{build_key, Admission, CacheStats, CacheStore, EstimateSize, KeyArg};
use crate::config::CacheConfig;
use crate::error::Result;

// == Timed Sized Cache ==
/// A [`CacheStore`] behind a mutex, keyed by `(operation_name, collections)`.
#[derive(Debug)]
pub struct TimedSizedCache<V> {
    store: Mutex<CacheStore<V>>,
    config: CacheConfig,
}

impl<V> TimedSizedCache<V> {
    /// Creates an empty cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            store: Mutex::new(CacheStore::from_config(&config)),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Frees at least `needed_bytes`. See [`CacheStore::evict`].
    pub fn evict(&self, needed_bytes: usize) -> Result<usize> {
        self.store.lock().evict(needed_bytes)
    }

    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    /// Returns the hit count of the entry for this call, if one is stored.
    pub fn hit_count(&self, operation_name: &str, collections: &[KeyArg]) -> Result<Option<u64>> {
        let key = build_key(operation_name, collections)?;
        Ok(self.store.lock().hit_count(&key))
    }
}

impl<V: Clone> TimedSizedCache<V> {
    // == Get ==
    /// Looks up the cached result for a call.
    ///
    /// # Returns
    /// - `Ok(Some(value))` on a live hit
    /// - `Ok(None)` when absent or expired
    /// - `Err(UnsupportedArgumentType)` when a collection cannot form a key
    pub fn get_item(&self, operation_name: &str, collections: &[KeyArg]) -> Result<Option<V>> {
        let key = build_key(operation_name, collections)?;
        let mut store = self.store.lock();
        Ok(store.get_item(&key).cloned())
    }
}

impl<V: EstimateSize> TimedSizedCache<V> {
    // == Set ==
    /// Caches the result of a call.
    ///
    /// An oversized item is reported as [`Admission::TooLarge`] and not cached.
    pub fn set_item(
        &self,
        operation_name: &str,
        item: V,
        collections: &[KeyArg],
    ) -> Result<Admission> {
        let key = build_key(operation_name, collections)?;
        self.store.lock().set_item(key, item)
    }
}

impl<V> Default for TimedSizedCache<V> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
