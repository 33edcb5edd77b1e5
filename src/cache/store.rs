//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with optional TTL expiration
//! and a background reaper.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::debug;

use crate::cache::stats::StatsRecorder;
use crate::cache::{duration_millis, CacheEntry, CacheStats};
use crate::config::CacheConfig;
use crate::tasks::{reap_interval, spawn_reaper, ReaperHandle, Sweep};

type EntryMap<V> = HashMap<String, CacheEntry<V>>;

// == TTL Mode ==
/// Present once the cache has entered TTL mode. Never removed.
#[derive(Debug)]
struct TtlMode {
    /// Applied to entries written without an explicit TTL and on every hit
    default_ttl: Duration,
    /// Keeps the reaper alive; dropping it stops the reaper
    reaper: ReaperHandle,
}

// == Shared State ==
struct CacheInner<V> {
    entries: RwLock<EntryMap<V>>,
    ttl: OnceLock<TtlMode>,
    stats: StatsRecorder,
}

impl<V> CacheInner<V> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: OnceLock::new(),
            stats: StatsRecorder::default(),
        }
    }

    // Writers never leave the map half-updated, so a poisoned lock is still usable.
    fn read_entries(&self) -> RwLockReadGuard<'_, EntryMap<V>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, EntryMap<V>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove_expired(&self) -> usize {
        if self.ttl.get().is_none() {
            return 0;
        }

        let removed = {
            let mut entries = self.write_entries();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired());
            before - entries.len()
        };

        self.stats.record_reaped(removed);
        removed
    }
}

impl<V: Send + Sync + 'static> Sweep for CacheInner<V> {
    fn sweep(&self) -> usize {
        self.remove_expired()
    }
}

// == Cache ==
/// Thread-safe in-memory key/value cache with optional sliding expiration.
///
/// A cache runs in one of two modes:
/// - *Unbounded*: entries live until deleted or cleared.
/// - *TTL*: every write and every successful read moves the entry's deadline
///   to one TTL from now, and a background reaper removes expired entries.
///
/// The only transition is from unbounded to TTL, triggered by the first
/// [`set_with_ttl`](Cache::set_with_ttl). Handles are cheap to clone and
/// share one underlying map. The reaper stops once the last handle is dropped.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use ttlcache::Cache;
///
/// let cache = Cache::with_ttl(Duration::from_secs(30));
/// cache.set("hello", "world".to_string());
/// assert_eq!(cache.get("hello").as_deref(), Some("world"));
/// ```
pub struct Cache<V> {
    inner: Arc<CacheInner<V>>,
}

impl<V: Send + Sync + 'static> Cache<V> {
    // == Constructors ==
    /// Creates an unbounded cache. No reaper is started.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CacheInner::new()),
        }
    }

    /// Creates a TTL cache and starts its reaper.
    ///
    /// The reaper ticks every `default_ttl`, or every millisecond if
    /// `default_ttl` is shorter than that.
    pub fn with_ttl(default_ttl: Duration) -> Self {
        let cache = Self::new();
        cache.ensure_ttl_mode(default_ttl);
        cache
    }

    /// Creates a cache from configuration. A missing default TTL builds an
    /// unbounded cache.
    pub fn from_config(config: &CacheConfig) -> Self {
        match config.default_ttl {
            Some(default_ttl) => Self::with_ttl(default_ttl),
            None => Self::new(),
        }
    }

    /// Enters TTL mode and starts the reaper, at most once per cache.
    ///
    /// Entries already present get a deadline one `default_ttl` from now.
    /// `default_ttl` is ignored if the cache is already in TTL mode.
    fn ensure_ttl_mode(&self, default_ttl: Duration) {
        if self.inner.ttl.get().is_some() {
            return;
        }

        // Writers check the mode under this lock, so none can slip in an
        // entry without a deadline during the switch.
        let entries = self.inner.write_entries();
        self.inner.ttl.get_or_init(|| {
            debug!(
                default_ttl_ms = duration_millis(default_ttl),
                existing = entries.len(),
                "Enabling TTL mode"
            );
            for entry in entries.values() {
                entry.touch(default_ttl);
            }
            TtlMode {
                default_ttl,
                reaper: spawn_reaper(Arc::downgrade(&self.inner), reap_interval(default_ttl)),
            }
        });
    }

    // == Set ==
    /// Inserts or replaces the entry at `key`.
    ///
    /// In TTL mode the new entry expires one default TTL from now. An
    /// overwritten entry's deadline is discarded.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let entry = CacheEntry::new(value);

        let mut entries = self.inner.write_entries();
        if let Some(mode) = self.inner.ttl.get() {
            entry.touch(mode.default_ttl);
        }
        entries.insert(key, entry);
    }

    /// Inserts or replaces the entry at `key`, expiring `ttl` from now.
    ///
    /// On an unbounded cache the first call switches the cache to TTL mode,
    /// adopts `ttl` as its default TTL, and starts the reaper.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.ensure_ttl_mode(ttl);

        let entry = CacheEntry::with_ttl(value, ttl);
        self.inner.write_entries().insert(key.into(), entry);
    }

    // == Get ==
    /// Returns a clone of the value at `key`.
    ///
    /// In TTL mode an expired entry reads as absent even before the reaper
    /// removes it, and a hit resets the entry's deadline to one default TTL
    /// from now. Store `Arc<T>` to make the clone cheap.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let found = {
            let entries = self.inner.read_entries();
            match (entries.get(key), self.inner.ttl.get()) {
                (Some(entry), None) => Some(entry.value().clone()),
                (Some(entry), Some(mode)) if !entry.is_expired() => {
                    entry.touch(mode.default_ttl);
                    Some(entry.value().clone())
                }
                _ => None,
            }
        };

        if found.is_some() {
            self.inner.stats.record_hit();
        } else {
            self.inner.stats.record_miss();
        }
        found
    }

    // == Touch ==
    /// Re-touches the live entry at `key` so it expires `ttl` from now.
    ///
    /// Returns false if there is no live entry. Does not change the cache
    /// mode, so on an unbounded cache the new deadline is not enforced.
    pub fn touch(&self, key: &str, ttl: Duration) -> bool {
        let entries = self.inner.read_entries();
        match entries.get(key) {
            Some(entry) if !self.is_expired_here(entry) => {
                entry.touch(ttl);
                true
            }
            _ => false,
        }
    }

    /// Returns true if `key` has a live entry. Does not refresh it.
    pub fn contains(&self, key: &str) -> bool {
        let entries = self.inner.read_entries();
        entries
            .get(key)
            .is_some_and(|entry| !self.is_expired_here(entry))
    }

    /// Returns the time left before the live entry at `key` expires.
    ///
    /// None if there is no live entry or the entry has no deadline.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let entries = self.inner.read_entries();
        entries
            .get(key)
            .filter(|entry| !self.is_expired_here(entry))
            .and_then(CacheEntry::ttl_remaining)
    }

    fn is_expired_here(&self, entry: &CacheEntry<V>) -> bool {
        self.inner.ttl.get().is_some() && entry.is_expired()
    }

    // == Delete ==
    /// Removes the entry at `key`. No-op if it does not exist.
    pub fn delete(&self, key: &str) {
        self.inner.write_entries().remove(key);
    }

    // == Clear ==
    /// Removes all entries. Mode and default TTL are unchanged.
    pub fn clear(&self) {
        self.inner.write_entries().clear();
    }

    // == Sweep Expired ==
    /// Removes all expired entries now, without waiting for the reaper.
    ///
    /// Returns the number of entries removed. Always 0 in unbounded mode.
    pub fn sweep_expired(&self) -> usize {
        self.inner.remove_expired()
    }

    // == Count ==
    /// Returns the raw number of entries, including expired entries the
    /// reaper has not removed yet.
    pub fn count(&self) -> usize {
        self.inner.read_entries().len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.read_entries().is_empty()
    }

    // == Mode ==
    /// Returns true once the cache is in TTL mode.
    pub fn is_ttl(&self) -> bool {
        self.inner.ttl.get().is_some()
    }

    /// Returns the default TTL, or None for an unbounded cache.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.inner.ttl.get().map(|mode| mode.default_ttl)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot(self.count())
    }

    /// Number of weak references to the shared state; each reaper holds one.
    #[cfg(test)]
    pub(crate) fn reaper_refs(&self) -> usize {
        Arc::weak_count(&self.inner)
    }
}

impl<V: Send + Sync + 'static> Default for Cache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("entries", &self.inner.read_entries().len())
            .field("default_ttl", &self.inner.ttl.get().map(|mode| mode.default_ttl))
            .field(
                "reap_interval",
                &self.inner.ttl.get().map(|mode| mode.reaper.interval()),
            )
            .finish()
    }
}
