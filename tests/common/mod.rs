#![allow(dead_code)]

use flashcache::{Cache, CacheConfig, Value};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

/// Janitor cadence used by the timing tests.
pub const CLEANUP_INTERVAL: Duration = Duration::from_millis(10);

/// TTL short enough to watch expire, long enough to observe before it does.
pub const SHORT_TTL: Duration = Duration::from_millis(100);

/// Slack added on top of a TTL before asserting it was reaped.
pub const SLEEP_MARGIN: Duration = Duration::from_millis(200);

static TRACING: Once = Once::new();

/// Routes crate logs to the test output. Honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "flashcache=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// A cache with millisecond clock ticks and a fast reaper.
pub fn fast_cache() -> Cache {
    init_tracing();
    let config = CacheConfig::default()
        .with_cleanup_interval(CLEANUP_INTERVAL)
        .with_precise_time(true);
    Cache::new(config).unwrap()
}

/// A cache with millisecond clock ticks and no automatic reaping.
pub fn manual_reap_cache() -> Cache {
    init_tracing();
    Cache::new(CacheConfig::default().with_precise_time(true)).unwrap()
}

/// Records every eviction the cache reports.
pub fn record_evictions(cache: &Cache) -> Arc<Mutex<Vec<(String, Value)>>> {
    let evicted = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&evicted);
    cache.on_evicted(move |key, value| sink.lock().unwrap().push((key.to_string(), value)));
    evicted
}
