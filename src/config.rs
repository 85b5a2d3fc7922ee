//! Configuration Module
//!
//! Handles cache configuration, either built in code or loaded from environment variables.

use std::env;
use std::time::Duration;

/// Default lifetime of a cached entry in seconds.
pub const DEFAULT_TTL_SECONDS: u64 = 30;

/// Default size budget in bytes (10 MB).
pub const DEFAULT_CAPACITY_BYTES: usize = 10 * 1024 * 1024;

/// Cache configuration parameters.
///
/// Fixed for the lifetime of the cache built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Time-to-live applied to every inserted entry
    pub ttl: Duration,
    /// Maximum aggregate estimated size of all entries
    pub capacity_bytes: usize,
}

impl CacheConfig {
    /// Creates a config with the given TTL and size budget.
    pub fn new(ttl: Duration, capacity_bytes: usize) -> Self {
        Self {
            ttl,
            capacity_bytes,
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECONDS` - Entry lifetime in seconds (default: 30)
    /// - `CACHE_CAPACITY_BYTES` - Size budget in bytes (default: 10485760)
    pub fn from_env() -> Self {
        Self {
            ttl: Duration::from_secs(
                env::var("CACHE_TTL_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_TTL_SECONDS),
            ),
            capacity_bytes: env::var("CACHE_CAPACITY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CAPACITY_BYTES),
        }
    }

    /// Returns a copy with a different TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns a copy with a different size budget.
    pub fn with_capacity_bytes(mut self, capacity_bytes: usize) -> Self {
        self.capacity_bytes = capacity_bytes;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
        }
    }
}
