//! Cache Module
//!
//! Provides a thread-safe in-memory cache with optional sliding TTL expiration.

mod entry;
mod stats;
mod store;


pub(crate) use entry::{duration_millis, CacheEntry};

// Re-export public types
pub use stats::CacheStats;
pub use store::Cache;
