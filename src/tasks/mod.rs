//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the life of a cache.
//!
//! # Tasks
//! - TTL Reaper: Removes expired cache entries once per default TTL

mod reaper;

pub(crate) use reaper::{reap_interval, spawn_reaper, ReaperHandle, Sweep};
