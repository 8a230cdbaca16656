//! Throughput Benchmark for EmberKV
//!
//! This benchmark measures the performance of the store engine
//! under various workloads.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use emberkv::storage::{StoreEngine, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let engine = Arc::new(StoreEngine::new());

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_string", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i);
            let _ = engine.set(&key, Value::from("small_value"));
            i += 1;
        });
    });

    group.bench_function("set_list", |b| {
        let mut i = 0u64;
        let list: Vec<String> = (0..32).map(|n| format!("item:{}", n)).collect();
        b.iter(|| {
            let key = format!("list:{}", i);
            let _ = engine.set(&key, Value::from(list.clone()));
            i += 1;
        });
    });

    group.bench_function("set_json_map", |b| {
        let mut i = 0u64;
        let map = serde_json::json!({"name": "John", "lang": "rust", "team": "core"});
        b.iter(|| {
            let key = format!("map:{}", i);
            let _ = engine.set_json(&key, map.clone());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let engine = Arc::new(StoreEngine::new());

    // Pre-populate with data
    for i in 0..100_000 {
        let _ = engine.set(&format!("key:{}", i), Value::from(format!("value:{}", i)));
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 100_000);
            let _ = black_box(engine.get(&key));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("missing:{}", i);
            let _ = black_box(engine.get(&key));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark indexed reads on lists and maps
fn bench_get_indexed(c: &mut Criterion) {
    let engine = Arc::new(StoreEngine::new());

    let list: Vec<String> = (0..1_000).map(|n| format!("item:{}", n)).collect();
    let _ = engine.set("list", Value::from(list));

    let map: BTreeMap<String, String> = (0..1_000)
        .map(|n| (format!("field:{}", n), format!("value:{}", n)))
        .collect();
    let _ = engine.set("map", Value::from(map));

    let mut group = c.benchmark_group("get_indexed");
    group.throughput(Throughput::Elements(1));

    group.bench_function("list_element", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let index = (i % 1_000).to_string();
            let _ = black_box(engine.get_indexed("list", &index));
            i += 1;
        });
    });

    group.bench_function("map_field", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let field = format!("field:{}", i % 1_000);
            let _ = black_box(engine.get_indexed("map", &field));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark mixed workload (80% reads, 20% writes)
fn bench_mixed(c: &mut Criterion) {
    let engine = Arc::new(StoreEngine::new());

    // Pre-populate
    for i in 0..10_000 {
        let _ = engine.set(&format!("key:{}", i), Value::from(format!("value:{}", i)));
    }

    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(1));

    group.bench_function("80_read_20_write", |b| {
        let mut i = 0u64;
        b.iter(|| {
            if i % 5 == 0 {
                // 20% writes
                let _ = engine.set(&format!("new:{}", i), Value::from("value"));
            } else {
                // 80% reads
                let key = format!("key:{}", i % 10_000);
                let _ = black_box(engine.get(&key));
            }
            i += 1;
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
            let engine = Arc::new(StoreEngine::new());
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let engine = Arc::clone(&engine);
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let key = format!("key:{}:{}", t, i);
                            let _ = engine.set(&key, Value::from("value"));
                            let _ = engine.get(&key);
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(engine.len());
        });
    });

    group.finish();
}

/// Benchmark expiry operations
fn bench_expiry(c: &mut Criterion) {
    let engine = Arc::new(StoreEngine::new());

    let mut group = c.benchmark_group("expiry");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_expires_existing", |b| {
        // Pre-create keys
        for i in 0..10_000 {
            let _ = engine.set(&format!("expire:{}", i), Value::from("value"));
        }

        let mut i = 0u64;
        b.iter(|| {
            let key = format!("expire:{}", i % 10_000);
            let _ = engine.set_expires(&key, 3600);
            i += 1;
        });
    });

    group.bench_function("sweep_nothing_due", |b| {
        b.iter(|| {
            black_box(engine.sweep_expired());
        });
    });

    group.finish();
}

/// Benchmark KEYS pattern matching
fn bench_keys(c: &mut Criterion) {
    let engine = Arc::new(StoreEngine::new());

    // Pre-populate with various key patterns
    for i in 0..1_000 {
        let _ = engine.set(&format!("user:{}", i), Value::from("user_data"));
        let _ = engine.set(&format!("session:{}", i), Value::from("session_data"));
        let _ = engine.set(&format!("cache:{}", i), Value::from("cache_data"));
    }

    let mut group = c.benchmark_group("keys");

    group.bench_function("keys_pattern", |b| {
        b.iter(|| {
            let _ = black_box(engine.keys("user:*"));
        });
    });

    group.bench_function("keys_class", |b| {
        b.iter(|| {
            let _ = black_box(engine.keys("[us]*:1?"));
        });
    });

    group.bench_function("keys_all", |b| {
        b.iter(|| {
            let _ = black_box(engine.keys("*"));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_get_indexed,
    bench_mixed,
    bench_concurrent,
    bench_expiry,
    bench_keys,
);

criterion_main!(benches);
