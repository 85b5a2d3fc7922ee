//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
///
/// An oversized item is not an error: it is reported as
/// [`Admission::TooLarge`](crate::cache::Admission) and simply not cached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// An argument handed to the key builder is not a sequence, set or mapping
    #[error("Unsupported argument type: {0}")]
    UnsupportedArgumentType(String),

    /// Eviction removed every entry and still could not free enough space
    #[error(
        "Cache cleanup failure: freed {freed_bytes} of {needed_bytes} needed bytes \
         (capacity {capacity_bytes})"
    )]
    CacheCleanupFailure {
        freed_bytes: usize,
        needed_bytes: usize,
        capacity_bytes: usize,
    },
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
