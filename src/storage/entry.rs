//! Entries and the expiration policy.
//!
//! Expiry is a logical state: an expired entry stays in its shard until the
//! janitor (or an explicit `delete_expired`) removes it. Every read path and
//! the reap path decide liveness through [`is_expired`].

use crate::storage::clock::nanos_to_system_time;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// Encoding of "never expires" in [`Entry::expires_at`].
pub const NO_EXPIRY: i64 = 0;

/// Returns true if an entry with the given deadline is expired at `now`.
///
/// Deadlines `<= 0` never expire. An entry is still live at exactly its
/// deadline and expired from the next nanosecond on.
#[inline]
pub fn is_expired(expires_at: i64, now: i64) -> bool {
    expires_at > NO_EXPIRY && now > expires_at
}

/// A stored value plus its absolute expiration instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<V> {
    /// The stored value
    pub value: V,
    /// Nanoseconds since the Unix epoch, or `<= 0` for never
    pub expires_at: i64,
}

impl<V> Entry<V> {
    pub fn new(value: V, expires_at: i64) -> Self {
        Self { value, expires_at }
    }

    /// An entry that never expires.
    pub fn permanent(value: V) -> Self {
        Self::new(value, NO_EXPIRY)
    }

    #[inline]
    pub fn is_expired(&self, now: i64) -> bool {
        is_expired(self.expires_at, now)
    }

    #[inline]
    pub fn is_live(&self, now: i64) -> bool {
        !self.is_expired(now)
    }

    /// True if the entry has no deadline.
    pub fn is_permanent(&self) -> bool {
        self.expires_at <= NO_EXPIRY
    }

    /// The absolute expiration instant, or None if the entry never expires.
    pub fn expiration(&self) -> Option<SystemTime> {
        nanos_to_system_time(self.expires_at)
    }

    /// Time left before expiry as seen at `now`.
    ///
    /// None for permanent entries; zero once the deadline has been reached.
    pub fn remaining(&self, now: i64) -> Option<Duration> {
        if self.is_permanent() {
            return None;
        }
        let left = self.expires_at.saturating_sub(now).max(0);
        Some(Duration::from_nanos(left.unsigned_abs()))
    }
}
