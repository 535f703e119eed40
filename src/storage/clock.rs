//! Cached Clock
//!
//! Reading the system clock on every cache operation is measurable at
//! sub-microsecond latencies. Instead, each cache keeps one atomic "now"
//! (nanoseconds since the Unix epoch) that a background task refreshes once
//! per tick. Every expiration decision reads this value, so an entry can stay
//! visible for up to one tick past its real expiration instant.
//!
//! The underlying time source is pluggable through [`TimeSource`], which lets
//! tests drive expiration deterministically with [`ManualClock`].

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A source of wall-clock time in nanoseconds since the Unix epoch.
pub trait TimeSource: Send + Sync + 'static {
    fn now_nanos(&self) -> i64;
}

/// Reads [`SystemTime::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now_nanos(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(duration_to_nanos)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
///
/// # Example
///
/// ```
/// use flashcache::storage::{ManualClock, TimeSource};
/// use std::time::Duration;
///
/// let clock = ManualClock::new(1_000);
/// clock.advance(Duration::from_nanos(500));
/// assert_eq!(clock.now_nanos(), 1_500);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_nanos: i64) -> Self {
        Self {
            now: AtomicI64::new(start_nanos),
        }
    }

    /// Starts the manual clock at the current system time.
    pub fn starting_now() -> Self {
        Self::new(SystemClock.now_nanos())
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(duration_to_nanos(by), Ordering::SeqCst);
    }

    pub fn set(&self, nanos: i64) {
        self.now.store(nanos, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now_nanos(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// The per-cache cached "now".
pub struct CachedClock {
    now: AtomicI64,
    source: Arc<dyn TimeSource>,
}

impl fmt::Debug for CachedClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedClock")
            .field("now", &self.now())
            .finish()
    }
}

impl CachedClock {
    /// Creates a clock primed with the source's current reading.
    pub fn new(source: Arc<dyn TimeSource>) -> Self {
        let now = AtomicI64::new(source.now_nanos());
        Self { now, source }
    }

    /// The cached reading. Never touches the time source.
    #[inline]
    pub fn now(&self) -> i64 {
        self.now.load(Ordering::Acquire)
    }

    /// Pulls a fresh reading from the time source and returns it.
    pub fn refresh(&self) -> i64 {
        let now = self.source.now_nanos();
        self.now.store(now, Ordering::Release);
        now
    }

    /// Absolute expiration timestamp for an entry stored now with `ttl`.
    /// Returns 0 ("never") when `ttl` is None.
    pub fn deadline(&self, ttl: Option<Duration>) -> i64 {
        match ttl {
            Some(ttl) => self.now().saturating_add(duration_to_nanos(ttl)).max(1),
            None => 0,
        }
    }
}

/// Converts a duration to nanoseconds, saturating at `i64::MAX`.
pub(crate) fn duration_to_nanos(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}

/// Converts an absolute nanosecond timestamp to a `SystemTime`.
/// Returns None for the "never expires" encoding.
pub(crate) fn nanos_to_system_time(nanos: i64) -> Option<SystemTime> {
    u64::try_from(nanos)
        .ok()
        .filter(|n| *n > 0)
        .map(|n| UNIX_EPOCH + Duration::from_nanos(n))
}
