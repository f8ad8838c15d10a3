//! KV store performance benchmarks

use boatyard_core::{KeyValueStore, MemoryStore};
use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::thread;

fn bench_kv_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("kv_operations");

    let store = MemoryStore::with_system_clock();

    group.bench_function("set_small", |b| {
        let value = Bytes::from_static(b"small_value");

        b.iter(|| {
            store
                .set(black_box("benchmark_key"), value.clone(), None)
                .unwrap();
        });
    });

    group.bench_function("set_large_with_ttl", |b| {
        let value = Bytes::from(vec![0u8; 4096]); // 4KB value

        b.iter(|| {
            store
                .set(black_box("benchmark_key_large"), value.clone(), Some(300))
                .unwrap();
        });
    });

    for i in 0..1000 {
        let key = format!("get_bench_key_{}", i);
        store
            .set(&key, Bytes::from(format!("value_{}", i)), Some(300))
            .unwrap();
    }

    group.bench_function("get_existing", |b| {
        b.iter(|| {
            let _value = store.get(black_box("get_bench_key_42")).unwrap();
        });
    });

    group.bench_function("get_missing", |b| {
        b.iter(|| {
            let _value = store.get(black_box("nonexistent_key")).unwrap();
        });
    });

    group.bench_function("incr_with_ttl", |b| {
        b.iter(|| {
            store
                .incr_with_ttl(black_box("ratelimit:127.0.0.1"), 60)
                .unwrap();
        });
    });

    group.finish();
}

fn bench_prefix_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("prefix_keys");

    for size in [100usize, 1_000, 10_000] {
        let store = MemoryStore::with_system_clock();
        for i in 0..size {
            let prefix = if i % 10 == 0 { "list" } else { "entity" };
            store
                .set(&format!("{}:{}", prefix, i), Bytes::from_static(b"[]"), Some(300))
                .unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(size), &store, |b, store| {
            b.iter(|| store.keys(black_box("list:*")).unwrap());
        });
    }

    group.finish();
}

fn bench_concurrent_kv(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_kv");

    let store = Arc::new(MemoryStore::with_system_clock());

    group.bench_function("concurrent_incr", |b| {
        b.iter(|| {
            let mut handles = Vec::new();

            // 4 threads, 2 clients
            for thread_id in 0..4 {
                let store = store.clone();
                let handle = thread::spawn(move || {
                    let key = format!("ratelimit:client_{}", thread_id % 2);
                    for _ in 0..100 {
                        store.incr_with_ttl(&key, 60).unwrap();
                    }
                });
                handles.push(handle);
            }

            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.bench_function("mixed_workload", |b| {
        for i in 0..1000 {
            store
                .set(&format!("mixed_key_{}", i), Bytes::from(format!("value_{}", i)), None)
                .unwrap();
        }

        b.iter(|| {
            let mut handles = Vec::new();

            // 70% GET, 30% SET
            for thread_id in 0..4 {
                let store = store.clone();
                let handle = thread::spawn(move || {
                    for i in 0..100 {
                        if i % 10 < 7 {
                            let key = format!("mixed_key_{}", (thread_id * 100 + i) % 1000);
                            store.get(&key).unwrap();
                        } else {
                            let key = format!("new_thread_{}_key_{}", thread_id, i);
                            store
                                .set(&key, Bytes::from(format!("new_value_{}", i)), Some(300))
                                .unwrap();
                        }
                    }
                });
                handles.push(handle);
            }

            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_kv_operations, bench_prefix_keys, bench_concurrent_kv);
criterion_main!(benches);
