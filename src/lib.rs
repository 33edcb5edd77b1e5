//! ttlcache - A thread-safe in-memory key/value cache
//!
//! Entries live forever in an unbounded cache, or expire after a sliding
//! time-to-live that a background reaper enforces.

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::{Cache, CacheStats};
pub use config::CacheConfig;
pub use error::{ConfigError, Result};
