//! Scoped acquisition and wrapping tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use mongo_locks_core::{
    LockError, LockManager, LockManagerOptions, LockStore, MemoryLockStore, ScopeOptions, locked,
};

fn manager(store: MemoryLockStore, namespace: &str) -> LockManager<MemoryLockStore> {
    LockManager::new(
        store,
        LockManagerOptions::new(namespace)
            .lease_duration(Duration::from_secs(5))
            .poll_interval(Duration::from_millis(20)),
    )
    .expect("valid options")
}

#[tokio::test]
async fn test_with_lock_runs_region_while_held() {
    let store = MemoryLockStore::new();
    let locks = manager(store.clone(), "jobs");

    let held_inside = locks
        .with_lock("job", ScopeOptions::new(), || async {
            locks.holds("job")
        })
        .await
        .unwrap();

    assert_eq!(held_inside, Some(true));
    // Released on the way out.
    assert!(!locks.holds("job"));
    assert_eq!(store.record_count(), 0);
}

#[tokio::test]
async fn test_with_lock_skips_region_on_contention() {
    let store = MemoryLockStore::new();
    let a = manager(store.clone(), "jobs");
    let b = manager(store.clone(), "jobs");

    assert!(a.acquire("job").await.unwrap());

    let ran = AtomicBool::new(false);
    let outcome = b
        .with_lock("job", ScopeOptions::new(), || async {
            ran.store(true, Ordering::SeqCst);
        })
        .await
        .unwrap();

    assert!(outcome.is_none());
    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_raise_on_failure_skips_region_with_error() {
    let store = MemoryLockStore::new();
    let a = manager(store.clone(), "jobs");
    let b = manager(store.clone(), "jobs");

    assert!(a.acquire("job").await.unwrap());

    let ran = AtomicBool::new(false);
    let outcome = b
        .with_lock("job", ScopeOptions::new().raise_on_failure(), || async {
            ran.store(true, Ordering::SeqCst);
        })
        .await;

    assert!(matches!(outcome, Err(LockError::LockFailure(key)) if key == "job"));
    assert!(!ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_with_lock_releases_on_error_path() {
    let store = MemoryLockStore::new();
    let a = manager(store.clone(), "jobs");
    let b = manager(store.clone(), "jobs");

    let outcome: Option<Result<(), &str>> = a
        .with_lock("job", ScopeOptions::new(), || async { Err("region failed") })
        .await
        .unwrap();
    assert_eq!(outcome, Some(Err("region failed")));

    // The error propagated out of the region, but the lease was released.
    assert!(b.acquire("job").await.unwrap());
}

#[tokio::test]
async fn test_with_lock_waits_for_lock() {
    let store = MemoryLockStore::new();
    let a = manager(store.clone(), "jobs");
    let b = manager(store.clone(), "jobs");

    assert!(a.acquire("job").await.unwrap());
    let release = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        a.release("job").await.unwrap();
    });

    let outcome = b
        .with_lock(
            "job",
            ScopeOptions::new().wait_for(Duration::from_secs(2)),
            || async { "ran" },
        )
        .await
        .unwrap();

    assert_eq!(outcome, Some("ran"));
    release.await.unwrap();
}

#[tokio::test]
async fn test_scope_guard_reports_and_releases() {
    let store = MemoryLockStore::new();
    let locks = manager(store.clone(), "jobs");

    let guard = locks.lock_scope("job", ScopeOptions::new()).await.unwrap();
    assert!(guard.acquired());
    assert!(locks.holds("job"));
    guard.release().await.unwrap();
    assert!(!locks.holds("job"));
    assert_eq!(store.record_count(), 0);
}

#[tokio::test]
async fn test_dropped_guard_leaves_lease_to_expire() {
    let store = MemoryLockStore::new();
    let locks = manager(store.clone(), "jobs");

    let guard = locks.lock_scope("job", ScopeOptions::new()).await.unwrap();
    assert!(guard.acquired());
    drop(guard);

    // No longer renewed by this instance, but the record was not deleted;
    // it will expire on its own.
    assert!(!locks.holds("job"));
    assert_eq!(store.record_count(), 1);
}

async fn sync() {
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_locked_macro_infers_key_from_callee_name() {
    let store = MemoryLockStore::new();
    let locks = Arc::new(manager(store.clone(), "jobs"));

    let runner = {
        let locks = locks.clone();
        tokio::spawn(async move {
            locked!(locks, sync).await.unwrap()
        })
    };

    // While the callee runs, the lock is held under the callee's own name.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(locks.holds("sync"));
    assert!(store.find("jobs__sync").await.unwrap().is_some());

    assert_eq!(runner.await.unwrap(), Some(()));
    assert_eq!(store.record_count(), 0);
}

#[tokio::test]
async fn test_locked_macro_with_options() {
    let store = MemoryLockStore::new();
    let a = manager(store.clone(), "jobs");
    let b = manager(store.clone(), "jobs");

    assert!(a.acquire("sync").await.unwrap());
    let outcome = locked!(b, sync, ScopeOptions::new().raise_on_failure()).await;
    assert!(matches!(outcome, Err(LockError::LockFailure(_))));
}
