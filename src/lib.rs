//! Timed Sized Cache - An embeddable memoization layer
//!
//! Caches results of deterministic operations keyed by their argument collections,
//! with TTL expiration and least-hit eviction under an approximate size budget.

pub mod cache;
pub mod config;
pub mod error;
pub mod memoize;

pub use cache::{Admission, CacheStats, EstimateSize, KeyArg, TimedSizedCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use memoize::Memoized;
