//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and hit tracking.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and accounting metadata.
///
/// Only `hit_count` changes after creation.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached result
    pub value: V,
    /// Estimated size at insertion time
    pub size_bytes: usize,
    /// Insertion time plus the configured TTL, None = never expires
    pub expires_at: Option<Instant>,
    /// Number of successful (non-expired) reads
    pub hit_count: u64,
    /// Insertion order, used to break eviction ties
    pub sequence: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    ///
    /// A TTL too large to represent as an instant means the entry never expires.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `size_bytes` - Estimated size of `value`
    /// * `ttl` - Lifetime of the entry
    /// * `sequence` - Insertion counter of the owning store
    pub fn new(value: V, size_bytes: usize, ttl: Duration, sequence: u64) -> Self {
        Self {
            value,
            size_bytes,
            expires_at: Instant::now().checked_add(ttl),
            hit_count: 0,
            sequence,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current time is greater
    /// than or equal to the expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks expiry against a given instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if the entry never expires.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` once expired
    /// - `Some(remaining)` while live
    /// - `None` if no expiry could be set
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }

    // == Record Hit ==
    /// Increments the hit counter in place.
    pub fn record_hit(&mut self) {
        self.hit_count = self.hit_count.saturating_add(1);
    }
}
