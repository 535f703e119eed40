//! Sharded Entry Store
//!
//! The store behind every cache handle: a fixed set of shards, each a
//! `RwLock<HashMap<String, Entry<V>>>`. A key always lives in the shard its
//! hash selects, so single-key operations take exactly one shard lock and
//! operations on keys in different shards never contend.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Store<V>                             │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store knows nothing about clocks or callbacks. Callers pass `now` in
//! and receive removed values back, so user code is never run while a shard
//! lock is held.

use crate::storage::entry::Entry;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Number of shards in the store.
/// More shards = less lock contention, but more memory overhead.
const NUM_SHARDS: usize = 64;

type Shard<V> = RwLock<HashMap<String, Entry<V>>>;

/// A concurrent map from key to [`Entry`].
pub struct Store<V> {
    shards: Vec<Shard<V>>,
}

impl<V> std::fmt::Debug for Store<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("shards", &self.shards.len())
            .field("len", &self.len())
            .finish()
    }
}

impl<V> Default for Store<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Store<V> {
    pub fn new() -> Self {
        let shards = (0..NUM_SHARDS).map(|_| RwLock::new(HashMap::new())).collect();
        Self { shards }
    }

    /// Determines which shard a key belongs to.
    #[inline]
    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    #[inline]
    fn shard(&self, key: &str) -> &Shard<V> {
        &self.shards[self.shard_index(key)]
    }

    /// Stores an entry unconditionally, returning the one it replaced.
    pub fn insert(&self, key: String, entry: Entry<V>) -> Option<Entry<V>> {
        self.shard(&key).write().insert(key, entry)
    }

    /// Stores `entry` only if `admit` approves the current occupant.
    ///
    /// The check and the write happen under one shard write lock, so no other
    /// operation on the key can interleave. Returns whether the entry was stored.
    pub fn insert_if<F>(&self, key: String, entry: Entry<V>, admit: F) -> bool
    where
        F: FnOnce(Option<&Entry<V>>) -> bool,
    {
        let mut data = self.shard(&key).write();
        if !admit(data.get(&key)) {
            return false;
        }
        data.insert(key, entry);
        true
    }

    /// Runs `read` against the key's entry under a shard read lock.
    pub fn read<R, F>(&self, key: &str, read: F) -> Option<R>
    where
        F: FnOnce(&Entry<V>) -> R,
    {
        self.shard(key).read().get(key).map(read)
    }

    /// Runs `update` against the key's entry under a shard write lock.
    ///
    /// Returns None if the key is absent.
    pub fn update<R, F>(&self, key: &str, update: F) -> Option<R>
    where
        F: FnOnce(&mut Entry<V>) -> R,
    {
        self.shard(key).write().get_mut(key).map(update)
    }

    /// Removes a key, returning its entry if it was present.
    pub fn remove(&self, key: &str) -> Option<Entry<V>> {
        self.shard(key).write().remove(key)
    }

    /// Removes every entry expired at `now`, one shard at a time.
    ///
    /// When `collect` is set, the removed `(key, value)` pairs are returned;
    /// otherwise they are dropped in place and only counted.
    pub fn remove_expired(&self, now: i64, collect: bool) -> (usize, Vec<(String, V)>) {
        let mut removed = 0usize;
        let mut evicted = Vec::new();

        for shard in &self.shards {
            let mut data = shard.write();
            if collect {
                let expired: Vec<String> = data
                    .iter()
                    .filter(|(_, entry)| entry.is_expired(now))
                    .map(|(key, _)| key.clone())
                    .collect();
                for key in expired {
                    if let Some(entry) = data.remove(&key) {
                        evicted.push((key, entry.value));
                        removed += 1;
                    }
                }
            } else {
                let before = data.len();
                data.retain(|_, entry| !entry.is_expired(now));
                removed += before - data.len();
            }
        }

        (removed, evicted)
    }

    /// Number of entries physically present, expired or not.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }

    /// Clears every shard.
    ///
    /// All shard write locks are taken before anything is cleared, so no
    /// reader can observe a partially flushed store.
    pub fn clear(&self) {
        let mut guards: Vec<_> = self.shards.iter().map(|shard| shard.write()).collect();
        for data in guards.iter_mut() {
            data.clear();
        }
    }
}

impl<V: Clone> Store<V> {
    /// Copies the entries accepted by `keep` into a new map.
    pub fn collect<F>(&self, mut keep: F) -> HashMap<String, Entry<V>>
    where
        F: FnMut(&Entry<V>) -> bool,
    {
        let mut out = HashMap::new();
        for shard in &self.shards {
            let data = shard.read();
            for (key, entry) in data.iter() {
                if keep(entry) {
                    out.insert(key.clone(), entry.clone());
                }
            }
        }
        out
    }
}
