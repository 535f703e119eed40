//! # FlashCache - An In-Process Key-Value Cache with Expiration
//!
//! FlashCache is a concurrent, in-memory key-value cache for a single
//! process. Entries carry an optional expiration instant, a background
//! janitor reaps expired entries, and an optional callback observes every
//! removal.
//!
//! ## Features
//!
//! - **Per-Entry TTL**: a default TTL per cache, overridable per call
//! - **Sharded Storage**: 64 shards behind `parking_lot::RwLock`s
//! - **Cached Clock**: one atomic "now" refreshed every second (or every
//!   millisecond in precise mode) instead of a system call per operation
//! - **Numeric Deltas**: increment/decrement in the stored number's own type
//! - **Eviction Callback**: invoked outside all locks, may re-enter the cache
//! - **Snapshots**: export entries to JSON and merge them back later
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Cache<V>                                   │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ set / add / │───>│ CachedClock │    │ on_evicted  │                  │
//! │  │ get / delta │    │  (AtomicI64)│    │  callback   │                  │
//! │  └──────┬──────┘    └──────▲──────┘    └──────▲──────┘                  │
//! │         │                  │                  │ after locks released    │
//! │         ▼                  │                  │                         │
//! │  ┌──────────────────────────────────────────────┐                       │
//! │  │                  Store<V>                    │                       │
//! │  │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ │                       │
//! │  │  │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N    │ │                       │
//! │  │  │RwLock  │ │RwLock  │ │RwLock  │ │shards  │ │                       │
//! │  │  └────────┘ └────────┘ └────────┘ └────────┘ │                       │
//! │  └──────────────────────────────────────────────┘                       │
//! │                      ▲                                                  │
//! │                      │                                                  │
//! │  ┌───────────────────┴─────────────────────────────────────────────┐    │
//! │  │            Janitor (reaper + clock refresher)                   │    │
//! │  │   dedicated "flashcache-janitor" thread, own Tokio runtime      │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use flashcache::{Cache, CacheConfig, Expiration, Value};
//! use std::time::Duration;
//!
//! let config = CacheConfig::new(Duration::from_secs(300), Duration::from_secs(60));
//! let cache: Cache = Cache::new(config).unwrap();
//!
//! cache.on_evicted(|key, value| println!("evicted {key}: {value:?}"));
//!
//! cache.set_default("user:1", "Ariz");
//! cache.set("visits", 0u32, Expiration::Never);
//! cache.increment("visits", 1).unwrap();
//!
//! assert_eq!(cache.get("user:1"), Some(Value::from("Ariz")));
//! assert_eq!(cache.get("visits"), Some(Value::from(1u32)));
//!
//! cache.close();
//! ```
//!
//! ## Module Overview
//!
//! - [`cache`]: the [`Cache`] handle and its operations
//! - [`config`]: construction parameters and per-call expiration
//! - [`numeric`]: numeric kinds and the delta protocol
//! - [`value`]: the default tagged [`Value`] type
//! - [`snapshot`]: JSON export and import
//! - [`storage`]: sharded store, cached clock and background janitor
//!
//! ## Design Highlights
//!
//! ### Expiration Is Observed, Not Enforced
//!
//! Reads treat an expired entry as absent but never remove it. Physical
//! removal happens in the reaper, in [`Cache::delete_expired`], or when a
//! write replaces the key. Item counts therefore include expired entries
//! that have not been reaped yet.
//!
//! ### Lifecycle
//!
//! The janitor tasks hold the shared store but not the handle's lifecycle
//! guard. When the last [`Cache`] clone is dropped the guard stops the tasks,
//! so an abandoned cache does not keep a thread alive.

pub mod cache;
pub mod config;
pub mod error;
pub mod numeric;
pub mod snapshot;
pub mod storage;
pub mod value;

// Re-export commonly used types for convenience
pub use cache::{Cache, CacheStats, EvictionListener};
pub use config::{CacheConfig, Expiration, CLOCK_TICK, PRECISE_CLOCK_TICK};
pub use error::{CacheError, Result};
pub use numeric::{Direction, Number, Numeric, NumericValue};
pub use snapshot::Snapshot;
pub use storage::{CachedClock, Entry, ManualClock, SystemClock, TimeSource, NO_EXPIRY};
pub use value::Value;

/// Version of FlashCache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
