//! Storage Layer
//!
//! The building blocks under [`crate::Cache`]: a sharded map of entries, the
//! cached clock every expiration decision reads, and the background janitor
//! that keeps the clock fresh and reaps expired entries.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Store<V>                             │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...64    │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//!              ▲                               ▲
//!              │ sweep                         │ now()
//!   ┌──────────┴──────────┐         ┌──────────┴──────────┐
//!   │   Janitor: reaper   │         │     CachedClock     │
//!   └─────────────────────┘         └──────────▲──────────┘
//!                                              │ refresh
//!                                   ┌──────────┴──────────┐
//!                                   │   Janitor: clock    │
//!                                   └─────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Sharded Storage**: 64 independent shards reduce lock contention
//! - **Absolute Deadlines**: entries store nanoseconds since the Unix epoch,
//!   `0` meaning "never"
//! - **Cached Time**: reads never touch the system clock
//! - **Pluggable Time Source**: [`ManualClock`] for deterministic tests
//!
//! ## Example
//!
//! ```
//! use flashcache::storage::{CachedClock, Entry, ManualClock, Store};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let source = Arc::new(ManualClock::new(1_000));
//! let clock = CachedClock::new(source.clone());
//! let store: Store<&str> = Store::new();
//!
//! let deadline = clock.deadline(Some(Duration::from_nanos(10)));
//! store.insert("session".to_string(), Entry::new("token", deadline));
//! store.insert("name".to_string(), Entry::permanent("Ariz"));
//!
//! source.advance(Duration::from_nanos(11));
//! let (removed, _) = store.remove_expired(clock.refresh(), false);
//! assert_eq!(removed, 1);
//! assert_eq!(store.len(), 1);
//! ```

pub mod clock;
pub mod engine;
pub mod entry;
pub mod expiry;

pub use clock::{CachedClock, ManualClock, SystemClock, TimeSource};
pub use engine::Store;
pub use entry::{is_expired, Entry, NO_EXPIRY};
pub use expiry::{Janitor, JanitorConfig, Sweep};
