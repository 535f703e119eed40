//! The cache handle.
//!
//! [`Cache`] ties together the sharded store, the cached clock, the eviction
//! callback and the background janitor. Handles are cheap to clone and every
//! clone operates on the same entries.
//!
//! ## Lifecycle
//!
//! ```text
//!   Cache ──┬── Arc<Shared<V>> ◄──────── janitor tasks (reaper, clock)
//!           │
//!           └── Arc<Lifecycle> ── Janitor (shutdown sender)
//! ```
//!
//! The janitor tasks hold the shared state but not the lifecycle guard, so
//! when the last handle is dropped the guard's `Drop` stops both tasks and the
//! shared state is freed once they exit. [`Cache::close`] stops them early.
//! A cache is only leaked if its handle is leaked.

use crate::config::{CacheConfig, Expiration};
use crate::error::{CacheError, Result};
use crate::numeric::{Direction, Number, Numeric, NumericValue};
use crate::storage::{
    CachedClock, Entry, Janitor, JanitorConfig, Store, Sweep, SystemClock, TimeSource,
};
use crate::value::Value;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Callback invoked with `(key, value)` when an entry is physically removed.
pub type EvictionListener<V> = Arc<dyn Fn(&str, V) + Send + Sync>;

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries physically present, including expired ones not yet reaped
    pub items: usize,
    /// Total lookups
    pub get_ops: u64,
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that found nothing live
    pub misses: u64,
    /// Total successful writes
    pub set_ops: u64,
    /// Total explicit deletes of present keys
    pub del_ops: u64,
    /// Total expired entries reaped
    pub expired: u64,
}

#[derive(Debug, Default)]
struct Counters {
    get_ops: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    set_ops: AtomicU64,
    del_ops: AtomicU64,
    expired: AtomicU64,
}

/// State shared between handles and the janitor tasks.
pub(crate) struct Shared<V> {
    store: Store<V>,
    clock: Arc<CachedClock>,
    default_ttl: Option<Duration>,
    on_evicted: RwLock<Option<EvictionListener<V>>>,
    counters: Counters,
}

impl<V: Send + Sync + 'static> Shared<V> {
    fn listener(&self) -> Option<EvictionListener<V>> {
        self.on_evicted.read().clone()
    }

    fn delete_expired(&self) -> usize {
        let now = self.clock.now();
        let listener = self.listener();
        let (removed, evicted) = self.store.remove_expired(now, listener.is_some());

        if removed > 0 {
            self.counters
                .expired
                .fetch_add(removed as u64, Ordering::Relaxed);
        }

        if let Some(listener) = listener {
            for (key, value) in evicted {
                listener(&key, value);
            }
        }

        removed
    }
}

impl<V: Send + Sync + 'static> Sweep for Shared<V> {
    fn sweep(&self) -> usize {
        self.delete_expired()
    }

    fn physical_len(&self) -> usize {
        self.store.len()
    }
}

/// Stops the janitor when the last handle goes away.
#[derive(Debug)]
struct Lifecycle {
    janitor: Janitor,
}

/// A concurrent key-value cache with per-entry expiration.
///
/// # Example
///
/// ```
/// use flashcache::{Cache, CacheConfig, Expiration, Value};
/// use std::time::Duration;
///
/// let cache: Cache = Cache::new(CacheConfig::default()).unwrap();
///
/// cache.set("name", "Ariz", Expiration::Never);
/// assert_eq!(cache.get("name"), Some(Value::from("Ariz")));
///
/// cache.set("hits", 0u64, Duration::from_secs(60));
/// cache.increment("hits", 1).unwrap();
/// assert_eq!(cache.get("hits"), Some(Value::from(1u64)));
/// ```
pub struct Cache<V = Value> {
    shared: Arc<Shared<V>>,
    lifecycle: Arc<Lifecycle>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            lifecycle: Arc::clone(&self.lifecycle),
        }
    }
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("store", &self.shared.store)
            .field("clock", &self.shared.clock)
            .field("default_ttl", &self.shared.default_ttl)
            .field("closed", &self.lifecycle.janitor.is_stopped())
            .finish()
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache and starts its background tasks.
    ///
    /// The clock refresher always runs; the reaper runs only when the
    /// configured cleanup interval is non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Spawn`] if the janitor could not be started.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_time_source(config, Arc::new(SystemClock))
    }

    /// Creates a cache whose clock reads from `source`.
    pub fn with_time_source(config: CacheConfig, source: Arc<dyn TimeSource>) -> Result<Self> {
        let clock = Arc::new(CachedClock::new(source));
        let shared = Arc::new(Shared {
            store: Store::new(),
            clock: Arc::clone(&clock),
            default_ttl: config.effective_default_ttl(),
            on_evicted: RwLock::new(None),
            counters: Counters::default(),
        });

        let janitor = Janitor::start(
            shared.clone(),
            clock,
            JanitorConfig {
                cleanup_interval: config.effective_cleanup_interval(),
                clock_tick: config.clock_tick(),
            },
        )?;

        Ok(Self {
            shared,
            lifecycle: Arc::new(Lifecycle { janitor }),
        })
    }

    /// Creates a cache pre-populated with `items`.
    ///
    /// Entries keep their absolute expiration instants, so a map taken from
    /// [`Cache::items`] restores with the same remaining lifetimes.
    pub fn from_items(config: CacheConfig, items: HashMap<String, Entry<V>>) -> Result<Self> {
        let cache = Self::new(config)?;
        for (key, entry) in items {
            cache.shared.store.insert(key, entry);
        }
        Ok(cache)
    }

    /// The cache's clock.
    pub fn clock(&self) -> &CachedClock {
        &self.shared.clock
    }

    fn deadline(&self, ttl: Expiration) -> i64 {
        self.shared
            .clock
            .deadline(ttl.resolve(self.shared.default_ttl))
    }

    fn entry(&self, value: V, ttl: Expiration) -> Entry<V> {
        Entry::new(value, self.deadline(ttl))
    }

    /// Stores a value, replacing any existing entry.
    pub fn set(&self, key: impl Into<String>, value: impl Into<V>, ttl: impl Into<Expiration>) {
        let entry = self.entry(value.into(), ttl.into());
        self.shared.store.insert(key.into(), entry);
        self.shared.counters.set_ops.fetch_add(1, Ordering::Relaxed);
    }

    /// Stores a value with the default TTL.
    pub fn set_default(&self, key: impl Into<String>, value: impl Into<V>) {
        self.set(key, value, Expiration::Default);
    }

    /// Stores a value only if the key holds no live entry.
    ///
    /// # Errors
    ///
    /// [`CacheError::AlreadyExists`] if a live entry is present.
    pub fn add(
        &self,
        key: impl Into<String>,
        value: impl Into<V>,
        ttl: impl Into<Expiration>,
    ) -> Result<()> {
        let key = key.into();
        let entry = self.entry(value.into(), ttl.into());
        let now = self.shared.clock.now();

        let stored = self
            .shared
            .store
            .insert_if(key.clone(), entry, |current| {
                current.map_or(true, |e| e.is_expired(now))
            });

        if !stored {
            return Err(CacheError::AlreadyExists(key));
        }
        self.shared.counters.set_ops.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Stores a value only if the key holds a live entry.
    ///
    /// # Errors
    ///
    /// [`CacheError::NotFound`] if the key is absent or expired.
    pub fn replace(
        &self,
        key: impl Into<String>,
        value: impl Into<V>,
        ttl: impl Into<Expiration>,
    ) -> Result<()> {
        let key = key.into();
        let entry = self.entry(value.into(), ttl.into());
        let now = self.shared.clock.now();

        let stored = self
            .shared
            .store
            .insert_if(key.clone(), entry, |current| {
                current.is_some_and(|e| e.is_live(now))
            });

        if !stored {
            return Err(CacheError::NotFound(key));
        }
        self.shared.counters.set_ops.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn live_entry<R>(&self, key: &str, read: impl FnOnce(&Entry<V>, i64) -> R) -> Option<R> {
        self.shared.counters.get_ops.fetch_add(1, Ordering::Relaxed);
        let now = self.shared.clock.now();

        let found = self
            .shared
            .store
            .read(key, |entry| entry.is_live(now).then(|| read(entry, now)))
            .flatten();

        let counter = if found.is_some() {
            &self.shared.counters.hits
        } else {
            &self.shared.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Returns the value if the key holds a live entry.
    pub fn get(&self, key: &str) -> Option<V> {
        self.live_entry(key, |entry, _| entry.value.clone())
    }

    /// Returns the value and its absolute expiration instant
    /// (None for entries that never expire).
    pub fn get_with_expiration(&self, key: &str) -> Option<(V, Option<SystemTime>)> {
        self.live_entry(key, |entry, _| (entry.value.clone(), entry.expiration()))
    }

    /// Returns the value and its remaining lifetime as seen by the cached clock
    /// (None for entries that never expire).
    pub fn get_with_ttl(&self, key: &str) -> Option<(V, Option<Duration>)> {
        self.live_entry(key, |entry, now| (entry.value.clone(), entry.remaining(now)))
    }

    /// True if the key holds a live entry.
    pub fn contains_key(&self, key: &str) -> bool {
        let now = self.shared.clock.now();
        self.shared
            .store
            .read(key, |entry| entry.is_live(now))
            .unwrap_or(false)
    }

    /// Removes a key.
    ///
    /// If the key was present and an eviction callback is registered, the
    /// callback receives the stored value (even if it had already expired).
    /// Returns whether the key was present.
    pub fn delete(&self, key: &str) -> bool {
        let Some(entry) = self.shared.store.remove(key) else {
            return false;
        };
        self.shared.counters.del_ops.fetch_add(1, Ordering::Relaxed);

        if let Some(listener) = self.shared.listener() {
            listener(key, entry.value);
        }
        true
    }

    /// Removes every expired entry now, firing the eviction callback for each.
    ///
    /// Callable regardless of the configured cleanup interval.
    pub fn delete_expired(&self) -> usize {
        let removed = self.shared.delete_expired();
        if removed > 0 {
            debug!(expired = removed, "Manual sweep removed expired keys");
        }
        removed
    }

    /// Copies every live entry into a new map.
    pub fn items(&self) -> HashMap<String, Entry<V>> {
        let now = self.shared.clock.now();
        self.shared.store.collect(|entry| entry.is_live(now))
    }

    /// Copies every physically present entry, expired or not.
    pub(crate) fn all_entries(&self) -> HashMap<String, Entry<V>> {
        self.shared.store.collect(|_| true)
    }

    /// Stores `entry` unless the key holds a live entry. Returns whether it was stored.
    pub(crate) fn merge_entry(&self, key: String, entry: Entry<V>) -> bool {
        let now = self.shared.clock.now();
        self.shared
            .store
            .insert_if(key, entry, |current| current.map_or(true, |e| e.is_expired(now)))
    }

    /// Number of entries physically present.
    ///
    /// This includes entries that have expired but have not been reaped yet,
    /// so it is an upper bound on the number of live entries.
    pub fn item_count(&self) -> usize {
        self.shared.store.len()
    }

    /// Removes every entry. No eviction callbacks fire.
    pub fn flush(&self) {
        self.shared.store.clear();
        debug!("Cache flushed");
    }

    /// Registers the eviction callback, replacing any previous one.
    ///
    /// The callback runs after all store locks are released, on the thread
    /// that performed the removal (the caller of `delete`, or the janitor).
    /// It may call back into the cache. A panicking callback is not contained.
    ///
    /// A callback that captures a clone of this cache keeps the janitor alive
    /// after the other handles are dropped; call [`Cache::close`] or
    /// [`Cache::clear_on_evicted`] to release it.
    pub fn on_evicted<F>(&self, listener: F)
    where
        F: Fn(&str, V) + Send + Sync + 'static,
    {
        *self.shared.on_evicted.write() = Some(Arc::new(listener));
    }

    /// Removes the eviction callback.
    pub fn clear_on_evicted(&self) {
        *self.shared.on_evicted.write() = None;
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let c = &self.shared.counters;
        CacheStats {
            items: self.item_count(),
            get_ops: c.get_ops.load(Ordering::Relaxed),
            hits: c.hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            set_ops: c.set_ops.load(Ordering::Relaxed),
            del_ops: c.del_ops.load(Ordering::Relaxed),
            expired: c.expired.load(Ordering::Relaxed),
        }
    }

    /// Stops the background tasks.
    ///
    /// The cache stays usable afterwards, but expired entries are only
    /// removed by [`Cache::delete_expired`] and the clock only moves through
    /// [`CachedClock::refresh`]. Calling this more than once is harmless.
    pub fn close(&self) {
        self.lifecycle.janitor.shutdown();
    }

    /// True once [`Cache::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.lifecycle.janitor.is_stopped()
    }
}

impl<V> Cache<V>
where
    V: NumericValue + Clone + Send + Sync + 'static,
{
    /// Runs `mutate` on the key's number under its shard lock and stores the result.
    fn mutate_number<F>(&self, key: &str, mutate: F) -> Result<Number>
    where
        F: FnOnce(Number) -> Result<Number>,
    {
        let now = self.shared.clock.now();
        let invalid = |value: &V| CacheError::InvalidType {
            key: key.to_string(),
            found: value.type_name(),
        };

        self.shared
            .store
            .update(key, |entry| {
                if entry.is_expired(now) {
                    return Err(CacheError::NotFound(key.to_string()));
                }
                let current = entry.value.to_number().ok_or_else(|| invalid(&entry.value))?;
                let next = mutate(current)?;
                entry.value = V::from_number(next).ok_or_else(|| invalid(&entry.value))?;
                Ok(next)
            })
            .unwrap_or_else(|| Err(CacheError::NotFound(key.to_string())))
    }

    /// Adds or subtracts `amount` from the stored number in place.
    ///
    /// The amount is converted to the stored number's own type first;
    /// integer overflow wraps. The entry keeps its expiration.
    ///
    /// # Errors
    ///
    /// - [`CacheError::NotFound`] if the key is absent or expired
    /// - [`CacheError::InvalidType`] if the stored value is not a number
    pub fn delta(
        &self,
        key: &str,
        amount: impl Into<Number>,
        direction: Direction,
    ) -> Result<Number> {
        let amount = amount.into();
        self.mutate_number(key, |current| Ok(current.apply(amount, direction)))
    }

    /// Adds `amount` to the stored number. See [`Cache::delta`].
    pub fn increment(&self, key: &str, amount: impl Into<Number>) -> Result<Number> {
        self.delta(key, amount, Direction::Increment)
    }

    /// Subtracts `amount` from the stored number. See [`Cache::delta`].
    pub fn decrement(&self, key: &str, amount: impl Into<Number>) -> Result<Number> {
        self.delta(key, amount, Direction::Decrement)
    }

    /// Like [`Cache::increment`], but only for a stored number of exactly type `N`.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidType`] if the stored number is of another kind.
    pub fn increment_exact<N: Numeric>(&self, key: &str, amount: N) -> Result<N> {
        self.exact_delta(key, amount, Direction::Increment)
    }

    /// Like [`Cache::decrement`], but only for a stored number of exactly type `N`.
    pub fn decrement_exact<N: Numeric>(&self, key: &str, amount: N) -> Result<N> {
        self.exact_delta(key, amount, Direction::Decrement)
    }

    fn exact_delta<N: Numeric>(&self, key: &str, amount: N, direction: Direction) -> Result<N> {
        let next = self.mutate_number(key, |current| {
            let stored = N::exact_from(current).ok_or_else(|| CacheError::InvalidType {
                key: key.to_string(),
                found: current.kind(),
            })?;
            Ok(stored.offset(amount, direction).into())
        })?;
        N::exact_from(next).ok_or_else(|| CacheError::InvalidType {
            key: key.to_string(),
            found: next.kind(),
        })
    }
}
