//! Cache Entry Module
//!
//! Defines a single cache entry and its sliding expiration deadline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Deadline value of an entry that never expires.
const NO_DEADLINE: u64 = 0;

// == Cache Entry ==
/// A stored value paired with its expiration deadline.
///
/// The deadline lives in an atomic so that a sliding read can refresh it
/// while the owning cache only holds a shared lock.
#[derive(Debug)]
pub(crate) struct CacheEntry<V> {
    /// The stored value
    value: V,
    /// Monotonic deadline in nanoseconds since the clock origin, 0 = none
    expires_at: AtomicU64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry with no expiration deadline.
    pub(crate) fn new(value: V) -> Self {
        Self {
            value,
            expires_at: AtomicU64::new(NO_DEADLINE),
        }
    }

    /// Creates an entry that expires `ttl` from now.
    pub(crate) fn with_ttl(value: V, ttl: Duration) -> Self {
        let entry = Self::new(value);
        entry.touch(ttl);
        entry
    }

    /// Returns a reference to the stored value.
    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    // == Touch ==
    /// Moves the deadline to `ttl` from now, replacing any earlier deadline.
    pub(crate) fn touch(&self, ttl: Duration) {
        let deadline = monotonic_now_nanos().saturating_add(duration_nanos(ttl));
        self.expires_at.store(deadline, Ordering::Relaxed);
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry without a deadline never expires. An entry with a deadline
    /// expires once the current time is strictly past it.
    pub(crate) fn is_expired(&self) -> bool {
        match self.deadline() {
            Some(deadline) => monotonic_now_nanos() > deadline,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the time left before expiry, or None if no deadline is set.
    ///
    /// Returns `Some(Duration::ZERO)` once the deadline has passed.
    pub(crate) fn ttl_remaining(&self) -> Option<Duration> {
        self.deadline().map(|deadline| {
            Duration::from_nanos(deadline.saturating_sub(monotonic_now_nanos()))
        })
    }

    fn deadline(&self) -> Option<u64> {
        match self.expires_at.load(Ordering::Relaxed) {
            NO_DEADLINE => None,
            deadline => Some(deadline),
        }
    }
}

// == Utility Functions ==
fn clock_origin() -> Instant {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    *ORIGIN.get_or_init(Instant::now)
}

/// Returns monotonic nanoseconds since the process-wide clock origin.
///
/// Never returns 0, which marks an entry without a deadline.
pub(crate) fn monotonic_now_nanos() -> u64 {
    duration_nanos(clock_origin().elapsed()).max(1)
}

fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
