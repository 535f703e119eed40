//! Cache Configuration
//!
//! [`CacheConfig`] carries the construction parameters of a cache and
//! [`Expiration`] is the per-call TTL request accepted by `set`, `add` and
//! `replace`.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Clock refresh cadence in normal mode.
pub const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Clock refresh cadence in precise mode.
pub const PRECISE_CLOCK_TICK: Duration = Duration::from_millis(1);

/// Construction parameters for a cache.
///
/// # Example
///
/// ```
/// use flashcache::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig::default()
///     .with_default_ttl(Duration::from_secs(300))
///     .with_cleanup_interval(Duration::from_secs(60));
///
/// assert_eq!(config.default_ttl, Some(Duration::from_secs(300)));
/// assert!(!config.precise_time);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL applied to `Expiration::Default` (None or zero = never expire)
    pub default_ttl: Option<Duration>,

    /// Reaper tick period (None or zero = no automatic reaping)
    pub cleanup_interval: Option<Duration>,

    /// Refresh the cached clock every millisecond instead of every second
    pub precise_time: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: None,
            cleanup_interval: None,
            precise_time: false,
        }
    }
}

impl CacheConfig {
    /// Creates a config with the given default TTL and cleanup interval.
    pub fn new(default_ttl: Duration, cleanup_interval: Duration) -> Self {
        Self::default()
            .with_default_ttl(default_ttl)
            .with_cleanup_interval(cleanup_interval)
    }

    /// Loads the config from environment variables.
    ///
    /// # Environment Variables
    /// - `FLASHCACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: never expire)
    /// - `FLASHCACHE_CLEANUP_INTERVAL_MS` - Reaper interval in milliseconds (default: disabled)
    /// - `FLASHCACHE_PRECISE_TIME` - `true`/`1` for millisecond clock ticks (default: false)
    pub fn from_env() -> Self {
        Self {
            default_ttl: env_millis("FLASHCACHE_DEFAULT_TTL_MS"),
            cleanup_interval: env_millis("FLASHCACHE_CLEANUP_INTERVAL_MS"),
            precise_time: env::var("FLASHCACHE_PRECISE_TIME")
                .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
                .unwrap_or(false),
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    pub fn with_precise_time(mut self, precise: bool) -> Self {
        self.precise_time = precise;
        self
    }

    /// The default TTL, or None if entries never expire by default.
    pub(crate) fn effective_default_ttl(&self) -> Option<Duration> {
        self.default_ttl.filter(|ttl| !ttl.is_zero())
    }

    /// The reaper interval, or None if automatic reaping is disabled.
    pub(crate) fn effective_cleanup_interval(&self) -> Option<Duration> {
        self.cleanup_interval.filter(|interval| !interval.is_zero())
    }

    /// How often the cached clock is refreshed.
    pub fn clock_tick(&self) -> Duration {
        if self.precise_time {
            PRECISE_CLOCK_TICK
        } else {
            CLOCK_TICK
        }
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

/// How long a stored entry should live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiration {
    /// Use the cache's configured default TTL.
    #[default]
    Default,
    /// Never expire.
    Never,
    /// Expire this long after the cached clock's current reading.
    /// A zero duration is treated as `Default`.
    After(Duration),
}

impl From<Duration> for Expiration {
    fn from(ttl: Duration) -> Self {
        Expiration::After(ttl)
    }
}

impl Expiration {
    /// Resolves the request to a concrete TTL (None = never expire).
    pub(crate) fn resolve(self, default_ttl: Option<Duration>) -> Option<Duration> {
        match self {
            Expiration::Never => None,
            Expiration::After(ttl) if !ttl.is_zero() => Some(ttl),
            Expiration::Default | Expiration::After(_) => default_ttl,
        }
    }
}
