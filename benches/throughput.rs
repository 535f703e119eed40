//! Throughput Benchmark for FlashCache
//!
//! This benchmark measures the performance of the cache under various
//! workloads.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use flashcache::{Cache, CacheConfig, Expiration, Value};
use std::time::Duration;

fn new_cache() -> Cache {
    Cache::new(CacheConfig::default()).unwrap()
}

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let cache = new_cache();

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            cache.set(format!("key:{}", i), "small_value", Expiration::Never);
            i += 1;
        });
    });

    group.bench_function("set_medium", |b| {
        let mut i = 0u64;
        let value = Value::from(Bytes::from("x".repeat(1024))); // 1KB value
        b.iter(|| {
            cache.set(format!("key:{}", i), value.clone(), Expiration::Never);
            i += 1;
        });
    });

    group.bench_function("set_with_ttl", |b| {
        let mut i = 0u64;
        b.iter(|| {
            cache.set(format!("ttl:{}", i), i, Duration::from_secs(3600));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let cache = new_cache();

    // Pre-populate with data
    for i in 0..100_000 {
        cache.set(format!("key:{}", i), format!("value:{}", i), Expiration::Never);
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(cache.get(&format!("key:{}", i % 100_000)));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(cache.get(&format!("missing:{}", i)));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark mixed workload (80% reads, 20% writes)
fn bench_mixed(c: &mut Criterion) {
    let cache = new_cache();

    // Pre-populate
    for i in 0..10_000 {
        cache.set(format!("key:{}", i), format!("value:{}", i), Expiration::Never);
    }

    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(1));

    group.bench_function("80_read_20_write", |b| {
        let mut i = 0u64;
        b.iter(|| {
            if i % 5 == 0 {
                // 20% writes
                cache.set(format!("new:{}", i), "value", Expiration::Never);
            } else {
                // 80% reads
                black_box(cache.get(&format!("key:{}", i % 10_000)));
            }
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark numeric deltas
fn bench_delta(c: &mut Criterion) {
    let cache = new_cache();
    cache.set("counter", 0i64, Expiration::Never);
    for i in 0..1000 {
        cache.set(format!("counter:{}", i), 0i64, Expiration::Never);
    }

    let mut group = c.benchmark_group("delta");
    group.throughput(Throughput::Elements(1));

    // Single counter (high contention)
    group.bench_function("single_counter", |b| {
        b.iter(|| {
            black_box(cache.increment("counter", 1i64).unwrap());
        });
    });

    // Multiple counters (low contention)
    group.bench_function("multiple_counters", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(cache.increment(&format!("counter:{}", i % 1000), 1i64).unwrap());
            i += 1;
        });
    });

    group.bench_function("exact_counter", |b| {
        b.iter(|| {
            black_box(cache.increment_exact("counter", 1i64).unwrap());
        });
    });

    group.finish();
}

/// Benchmark concurrent access
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let cache = new_cache();
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let cache = cache.clone();
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let key = format!("key:{}:{}", t, i);
                            cache.set(key.clone(), "value", Expiration::Never);
                            cache.get(&key);
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(cache.item_count());
        });
    });

    group.finish();
}

/// Benchmark reaping expired entries
fn bench_reap(c: &mut Criterion) {
    let mut group = c.benchmark_group("reap");

    group.bench_function("delete_expired_10k", |b| {
        b.iter_with_setup(
            || {
                let cache = new_cache();
                for i in 0..10_000 {
                    cache.set(format!("expire:{}", i), "value", Duration::from_nanos(1));
                }
                cache.clock().refresh();
                cache
            },
            |cache| black_box(cache.delete_expired()),
        );
    });

    group.bench_function("items_10k", |b| {
        let cache = new_cache();
        for i in 0..10_000 {
            cache.set(format!("item:{}", i), "value", Expiration::Never);
        }
        b.iter(|| {
            black_box(cache.items());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_mixed,
    bench_delta,
    bench_concurrent,
    bench_reap,
);

criterion_main!(benches);
