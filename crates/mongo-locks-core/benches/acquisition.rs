//! Benchmarks for acquisition latency against the in-memory store.

use criterion::{Criterion, criterion_group, criterion_main};
use mongo_locks_core::{LockManager, LockManagerOptions, MemoryLockStore};
use std::time::Duration;

fn bench_acquisition(c: &mut Criterion) {
    let store = MemoryLockStore::new();
    let locks = LockManager::new(
        store.clone(),
        LockManagerOptions::new("bench").lease_duration(Duration::from_secs(30)),
    )
    .unwrap();

    let mut group = c.benchmark_group("memory_lock");
    group.bench_function("acquire_release", |b| {
        b.to_async(tokio::runtime::Runtime::new().unwrap())
            .iter(|| async {
                if locks.acquire("bench-lock").await.unwrap() {
                    locks.release("bench-lock").await.unwrap();
                }
            });
    });

    let holder = LockManager::new(
        store.clone(),
        LockManagerOptions::new("bench_contended").lease_duration(Duration::from_secs(30)),
    )
    .unwrap();
    let contender = LockManager::new(
        store,
        LockManagerOptions::new("bench_contended").lease_duration(Duration::from_secs(30)),
    )
    .unwrap();

    group.bench_function("acquire_contended", |b| {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            if !holder.holds("bench-lock") {
                assert!(holder.acquire("bench-lock").await.unwrap());
            }
        });
        b.to_async(runtime).iter(|| async {
            assert!(!contender.acquire("bench-lock").await.unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_acquisition);
criterion_main!(benches);
