//! Cache Module
//!
//! Provides in-memory memoization storage with TTL expiration and a size budget.

mod entry;
mod eviction;
mod key;
mod size;
mod stats;
mod store;
mod timed;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use eviction::{plan_eviction, EvictionPlan};
pub use key::{build_key, KeyArg, KeyAtom, ToKeyArg};
pub use size::{EstimateSize, SizeContext, MAX_DEPTH};
pub use stats::CacheStats;
pub use store::{Admission, CacheStore};
pub use timed::TimedSizedCache;
