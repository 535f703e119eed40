mod common;

use common::{init_tracing, record_evictions, CLEANUP_INTERVAL, SHORT_TTL, SLEEP_MARGIN};
use flashcache::{Cache, CacheConfig, Expiration, Value};
use std::time::Duration;

fn runtime_cache() -> Cache {
    init_tracing();
    let config = CacheConfig::default()
        .with_cleanup_interval(CLEANUP_INTERVAL)
        .with_precise_time(true);
    Cache::new(config).unwrap()
}

#[tokio::test]
async fn test_async_janitor_reaps_inside_runtime() {
    let cache = runtime_cache();
    let evicted = record_evictions(&cache);

    cache.set("key", "value", SHORT_TTL);
    tokio::time::sleep(SHORT_TTL + SLEEP_MARGIN).await;

    assert!(cache.get("key").is_none());
    assert_eq!(cache.item_count(), 0);
    assert_eq!(
        *evicted.lock().unwrap(),
        vec![("key".to_string(), Value::from("value"))]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_handles_shared_across_tasks() {
    let cache = runtime_cache();

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let cache = cache.clone();
            tokio::spawn(async move {
                for i in 0..250 {
                    cache.set(format!("task:{}:{}", t, i), i as i64, Expiration::Never);
                }
            })
        })
        .collect();
    for writer in writers {
        writer.await.unwrap();
    }

    assert_eq!(cache.item_count(), 1_000);
    assert_eq!(cache.get("task:3:249"), Some(Value::from(249i64)));
}

#[tokio::test]
async fn test_async_close_stops_reaping() {
    let cache = runtime_cache();
    cache.close();
    assert!(cache.is_closed());

    cache.set("key", 1u8, Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The clock is frozen too, so the entry still reads as live.
    assert_eq!(cache.get("key"), Some(Value::from(1u8)));
    assert_eq!(cache.item_count(), 1);
}
