//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with size-budget admission,
//! least-hit eviction and lazy TTL expiration.
//!
//! `CacheStore` itself is single-threaded; [`TimedSizedCache`](crate::cache::TimedSizedCache)
//! puts it behind a lock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::cache::{plan_eviction, CacheEntry, CacheStats, EstimateSize};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Admission ==
/// Outcome of a [`CacheStore::set_item`] call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The item was inserted, after evicting `evicted` entries
    Stored { size_bytes: usize, evicted: usize },
    /// The item alone reaches the size budget and was not cached
    TooLarge {
        size_bytes: usize,
        capacity_bytes: usize,
    },
}

impl Admission {
    pub fn is_stored(&self) -> bool {
        matches!(self, Admission::Stored { .. })
    }
}

// == Cache Store ==
/// Cache storage with a byte budget, least-hit eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// Lifetime applied to every inserted entry
    ttl: Duration,
    /// Maximum aggregate estimated size
    capacity_bytes: usize,
    /// Running sum of `size_bytes` over `entries`
    occupancy_bytes: usize,
    /// Insertion counter for eviction tie-breaks
    next_sequence: u64,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with the given TTL and size budget.
    ///
    /// # Arguments
    /// * `ttl` - Lifetime of every inserted entry
    /// * `capacity_bytes` - Maximum aggregate estimated size of all entries
    pub fn new(ttl: Duration, capacity_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            ttl,
            capacity_bytes,
            occupancy_bytes: 0,
            next_sequence: 0,
        }
    }

    /// Creates a new CacheStore from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl, config.capacity_bytes)
    }

    // == Get ==
    /// Retrieves a live value by key and records the hit against the stored entry.
    ///
    /// An entry read at or past its expiration time is removed and reported as absent.
    pub fn get_item(&mut self, key: &str) -> Option<&V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(Instant::now()),
            None => {
                self.stats.record_miss();
                debug!(key, "Cache miss");
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expiration();
            self.sync_stats();
            debug!(key, "Cache entry expired");
            return None;
        }

        self.stats.record_hit();
        let entry = self.entries.get_mut(key)?;
        entry.record_hit();
        debug!(key, hit_count = entry.hit_count, "Cache hit");
        Some(&entry.value)
    }

    // == Evict ==
    /// Frees at least `needed_bytes`, removing entries in ascending hit count.
    ///
    /// Returns the number of entries removed. If every entry is removed and the
    /// target is still not met, returns `CacheCleanupFailure`; the store is left empty.
    pub fn evict(&mut self, needed_bytes: usize) -> Result<usize> {
        debug!(needed_bytes, "Going to clean cache");

        let plan = plan_eviction(&self.entries, needed_bytes);

        for key in &plan.victims {
            if let Some(entry) = self.remove_entry(key) {
                self.stats.record_eviction();
                debug!(
                    key = key.as_str(),
                    size_bytes = entry.size_bytes,
                    hit_count = entry.hit_count,
                    "Evicted cache entry"
                );
            }
        }
        self.sync_stats();

        if !plan.satisfied {
            error!(
                freed_bytes = plan.freed_bytes,
                needed_bytes,
                capacity_bytes = self.capacity_bytes,
                "Nothing left to evict but still not enough space"
            );
            return Err(CacheError::CacheCleanupFailure {
                freed_bytes: plan.freed_bytes,
                needed_bytes,
                capacity_bytes: self.capacity_bytes,
            });
        }

        debug!(
            freed_bytes = plan.freed_bytes,
            needed_bytes, "Cache cleanup finished"
        );
        Ok(plan.victims.len())
    }

    // == Accessors ==
    /// Returns the hit count of a stored entry without touching it.
    pub fn hit_count(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.hit_count)
    }

    /// Returns true if an entry is stored under `key`, expired or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the sum of the stored entries' estimated sizes.
    pub fn occupancy_bytes(&self) -> usize {
        self.occupancy_bytes
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_occupancy(self.entries.len(), self.occupancy_bytes);
        stats
    }

    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.occupancy_bytes -= entry.size_bytes;
        Some(entry)
    }

    fn sync_stats(&mut self) {
        self.stats.set_occupancy(self.entries.len(), self.occupancy_bytes);
    }
}

impl<V: EstimateSize> CacheStore<V> {
    // == Set ==
    /// Stores a value under `key`, expiring after the configured TTL.
    ///
    /// An existing entry under the same key is replaced and its hit count reset.
    /// Items whose estimated size reaches the budget are not stored.
    /// If the insertion would reach the budget, entries are evicted first.
    pub fn set_item(&mut self, key: String, value: V) -> Result<Admission> {
        let size_bytes = value.estimate_size();

        if size_bytes >= self.capacity_bytes {
            warn!(
                key = key.as_str(),
                size_bytes,
                capacity_bytes = self.capacity_bytes,
                "Item is too large to cache"
            );
            self.stats.record_rejection();
            return Ok(Admission::TooLarge {
                size_bytes,
                capacity_bytes: self.capacity_bytes,
            });
        }

        let mut evicted = 0;
        if self.occupancy_bytes + size_bytes >= self.capacity_bytes {
            evicted = self.evict(size_bytes)?;
        }

        let entry = CacheEntry::new(value, size_bytes, self.ttl, self.next_sequence);
        self.next_sequence += 1;
        self.occupancy_bytes += size_bytes;
        if let Some(previous) = self.entries.insert(key, entry) {
            self.occupancy_bytes -= previous.size_bytes;
        }
        self.sync_stats();

        Ok(Admission::Stored {
            size_bytes,
            evicted,
        })
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;
    use std::thread::sleep;

    /// `vec![0u8; n]` has exactly this estimated size.
    fn blob(total_bytes: usize) -> Vec<u8> {
        vec![0u8; total_bytes - size_of::<Vec<u8>>()]
    }

    #[test]
    fn test_store_new() {
        let store: CacheStore<Vec<u8>> = CacheStore::new(Duration::from_secs(30), 1000);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.occupancy_bytes(), 0);
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = CacheStore::new(Duration::from_secs(30), 1000);

        let admission = store.set_item("key1".to_string(), blob(100)).unwrap();
        assert_eq!(
            admission,
            Admission::Stored {
                size_bytes: 100,
                evicted: 0
            }
        );

        assert_eq!(store.get_item("key1"), Some(&blob(100)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.occupancy_bytes(), 100);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store: CacheStore<Vec<u8>> = CacheStore::new(Duration::from_secs(30), 1000);

        assert_eq!(store.get_item("nonexistent"), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_store_overwrite_resets_entry() {
        let mut store = CacheStore::new(Duration::from_secs(30), 1000);

        store.set_item("key1".to_string(), blob(100)).unwrap();
        store.get_item("key1");
        store.set_item("key1".to_string(), blob(200)).unwrap();

        assert_eq!(store.hit_count("key1"), Some(0));
        assert_eq!(store.get_item("key1"), Some(&blob(200)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.occupancy_bytes(), 200);
    }

    #[test]
    fn test_store_ttl_expiration() {
        let mut store = CacheStore::new(Duration::from_millis(50), 1000);

        store.set_item("key1".to_string(), blob(100)).unwrap();
        assert!(store.get_item("key1").is_some());

        sleep(Duration::from_millis(80));

        assert_eq!(store.get_item("key1"), None);
        assert!(!store.contains_key("key1"), "Expired entry should be removed on read");
        assert_eq!(store.occupancy_bytes(), 0);
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_expired_entry_stays_until_read() {
        let mut store = CacheStore::new(Duration::from_millis(20), 1000);

        store.set_item("key1".to_string(), blob(100)).unwrap();
        sleep(Duration::from_millis(40));

        assert!(store.contains_key("key1"));
        assert_eq!(store.get_item("key1"), None);
        assert!(!store.contains_key("key1"));
    }

    #[test]
    fn test_hit_count_persists() {
        let mut store = CacheStore::new(Duration::from_secs(30), 1000);
        store.set_item("key1".to_string(), blob(100)).unwrap();

        for expected in 1..=5 {
            store.get_item("key1");
            assert_eq!(store.hit_count("key1"), Some(expected));
        }
    }

    #[test]
    fn test_item_too_large_is_not_stored() {
        let mut store = CacheStore::new(Duration::from_secs(30), 1000);

        let admission = store.set_item("big".to_string(), blob(1000)).unwrap();

        assert_eq!(
            admission,
            Admission::TooLarge {
                size_bytes: 1000,
                capacity_bytes: 1000
            }
        );
        assert_eq!(store.get_item("big"), None);
        assert_eq!(store.stats().rejections, 1);
    }

    #[test]
    fn test_too_large_item_leaves_existing_entries() {
        let mut store = CacheStore::new(Duration::from_secs(30), 1000);
        store.set_item("small".to_string(), blob(100)).unwrap();

        store.set_item("big".to_string(), blob(5000)).unwrap();

        assert!(store.get_item("small").is_some());
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_store_evicts_least_hit_entries() {
        let mut store = CacheStore::new(Duration::from_secs(30), 1000);

        for key in ["a", "b", "c", "d"] {
            store.set_item(key.to_string(), blob(200)).unwrap();
        }
        // Hits: a=3, b=0, c=1, d=2
        for (key, hits) in [("a", 3), ("c", 1), ("d", 2)] {
            for _ in 0..hits {
                store.get_item(key);
            }
        }

        // 800 + 200 reaches the budget, so 200 bytes must go
        let admission = store.set_item("e".to_string(), blob(200)).unwrap();
        assert_eq!(
            admission,
            Admission::Stored {
                size_bytes: 200,
                evicted: 1
            }
        );
        assert!(!store.contains_key("b"));
        assert!(store.contains_key("c"));

        // 300 bytes needed: e (0 hits) then c (1 hit) go
        store.set_item("f".to_string(), blob(300)).unwrap();
        assert!(!store.contains_key("e"));
        assert!(!store.contains_key("c"));
        assert!(store.contains_key("d"));
        assert!(store.contains_key("a"));
        assert!(store.occupancy_bytes() < store.capacity_bytes());
    }

    #[test]
    fn test_eviction_tie_breaks_oldest_first() {
        let mut store = CacheStore::new(Duration::from_secs(30), 500);

        store.set_item("old".to_string(), blob(200)).unwrap();
        store.set_item("new".to_string(), blob(200)).unwrap();
        store.set_item("third".to_string(), blob(200)).unwrap();

        assert!(!store.contains_key("old"));
        assert!(store.contains_key("new"));
        assert!(store.contains_key("third"));
    }

    #[test]
    fn test_cleanup_failure_is_reported() {
        let mut store = CacheStore::new(Duration::from_secs(30), 100);

        store.set_item("a".to_string(), blob(45)).unwrap();
        let result = store.set_item("b".to_string(), blob(60));

        assert_eq!(
            result,
            Err(CacheError::CacheCleanupFailure {
                freed_bytes: 45,
                needed_bytes: 60,
                capacity_bytes: 100,
            })
        );
        assert!(store.is_empty());
        assert_eq!(store.occupancy_bytes(), 0);
    }

    #[test]
    fn test_explicit_evict() {
        let mut store = CacheStore::new(Duration::from_secs(30), 1000);
        store.set_item("a".to_string(), blob(100)).unwrap();
        store.set_item("b".to_string(), blob(100)).unwrap();

        assert_eq!(store.evict(150), Ok(2));
        assert!(store.is_empty());
        assert_eq!(store.evict(0), Ok(0));
    }

    #[test]
    fn test_store_stats() {
        let mut store = CacheStore::new(Duration::from_secs(30), 1000);

        store.set_item("key1".to_string(), blob(100)).unwrap();
        store.get_item("key1"); // hit
        store.get_item("nonexistent"); // miss

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.occupancy_bytes, 100);
    }

    #[test]
    fn test_huge_ttl_stores_without_expiry() {
        let mut store = CacheStore::new(Duration::from_secs(u64::MAX), 1000);

        let admission = store.set_item("key1".to_string(), blob(100)).unwrap();

        assert!(admission.is_stored());
        assert_eq!(store.get_item("key1"), Some(&blob(100)));
        assert_eq!(store.hit_count("key1"), Some(1));
    }

    #[test]
    fn test_from_config() {
        let config = CacheConfig::default();
        let store: CacheStore<u64> = CacheStore::from_config(&config);

        assert_eq!(store.ttl(), config.ttl);
        assert_eq!(store.capacity_bytes(), config.capacity_bytes);
    }
}
