//! In-memory lock store.
//!
//! Implements the same conditional-write semantics as a real document
//! store, with a process-local map standing in for the shared collection.
//! Intended for tests and single-process development; clones share the
//! same map, so several managers over clones of one store contend the way
//! separate processes would against a shared store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use crate::error::{LockError, LockResult};
use crate::store::{HeldLease, LockRecord, LockStore};

#[derive(Debug)]
struct StoredRecord {
    token: String,
    expires_at: SystemTime,
}

/// Shared in-memory [`LockStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryLockStore {
    records: Arc<Mutex<HashMap<String, StoredRecord>>>,
    fail_claims: Arc<AtomicU32>,
    fail_extends: Arc<AtomicU32>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored, live or stale.
    pub fn record_count(&self) -> usize {
        self.records.lock().expect("store poisoned").len()
    }

    /// Makes the next `n` claim calls fail with an injected store error.
    pub fn fail_next_claims(&self, n: u32) {
        self.fail_claims.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` extend calls fail with an injected store error.
    pub fn fail_next_extends(&self, n: u32) {
        self.fail_extends.store(n, Ordering::SeqCst);
    }

    /// Force-expires the record for `id`, as if its holder had stopped
    /// renewing long ago.
    pub fn expire(&self, id: &str) {
        if let Some(record) = self.records.lock().expect("store poisoned").get_mut(id) {
            record.expires_at = SystemTime::UNIX_EPOCH;
        }
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn injected_failure() -> LockError {
        LockError::store(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "injected store failure",
        ))
    }
}

impl LockStore for MemoryLockStore {
    async fn claim(&self, id: &str, token: &str, lease: Duration) -> LockResult<Option<LockRecord>> {
        if Self::take_failure(&self.fail_claims) {
            return Err(Self::injected_failure());
        }

        let mut records = self.records.lock().expect("store poisoned");
        let now = SystemTime::now();
        let record = records
            .entry(id.to_string())
            .and_modify(|existing| {
                if existing.expires_at <= now {
                    existing.token = token.to_string();
                    existing.expires_at = now + lease;
                }
            })
            .or_insert_with(|| StoredRecord {
                token: token.to_string(),
                expires_at: now + lease,
            });

        Ok(Some(LockRecord {
            id: id.to_string(),
            holder_token: record.token.clone(),
            expires_at: record.expires_at,
        }))
    }

    async fn release(&self, id: &str, token: &str) -> LockResult<()> {
        let mut records = self.records.lock().expect("store poisoned");
        if records.get(id).is_some_and(|record| record.token == token) {
            records.remove(id);
        }
        Ok(())
    }

    async fn extend(&self, held: &[HeldLease], lease: Duration) -> LockResult<u64> {
        if Self::take_failure(&self.fail_extends) {
            return Err(Self::injected_failure());
        }

        let mut records = self.records.lock().expect("store poisoned");
        let now = SystemTime::now();
        let mut extended = 0;
        for lease_ref in held {
            if let Some(record) = records.get_mut(&lease_ref.id)
                && record.token == lease_ref.token
            {
                record.expires_at = now + lease;
                extended += 1;
            }
        }
        Ok(extended)
    }

    async fn find(&self, id: &str) -> LockResult<Option<LockRecord>> {
        let records = self.records.lock().expect("store poisoned");
        Ok(records.get(id).map(|record| LockRecord {
            id: id.to_string(),
            holder_token: record.token.clone(),
            expires_at: record.expires_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_vacant_wins() {
        let store = MemoryLockStore::new();
        let record = store
            .claim("ns__a", "t1", Duration::from_secs(5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.holder_token, "t1");
        assert!(record.is_live());
    }

    #[tokio::test]
    async fn test_claim_live_record_untouched() {
        let store = MemoryLockStore::new();
        store.claim("ns__a", "t1", Duration::from_secs(5)).await.unwrap();
        let record = store
            .claim("ns__a", "t2", Duration::from_secs(5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.holder_token, "t1");
    }

    #[tokio::test]
    async fn test_claim_stale_record_taken_over() {
        let store = MemoryLockStore::new();
        store.claim("ns__a", "t1", Duration::from_secs(5)).await.unwrap();
        store.expire("ns__a");
        let record = store
            .claim("ns__a", "t2", Duration::from_secs(5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.holder_token, "t2");
    }

    #[tokio::test]
    async fn test_release_requires_matching_token() {
        let store = MemoryLockStore::new();
        store.claim("ns__a", "t1", Duration::from_secs(5)).await.unwrap();
        store.release("ns__a", "other").await.unwrap();
        assert_eq!(store.record_count(), 1);
        store.release("ns__a", "t1").await.unwrap();
        assert_eq!(store.record_count(), 0);
    }

    #[tokio::test]
    async fn test_extend_skips_mismatched_tokens() {
        let store = MemoryLockStore::new();
        store.claim("ns__a", "t1", Duration::from_secs(5)).await.unwrap();
        store.claim("ns__b", "t2", Duration::from_secs(5)).await.unwrap();
        let held = vec![
            HeldLease { id: "ns__a".to_string(), token: "t1".to_string() },
            HeldLease { id: "ns__b".to_string(), token: "stale".to_string() },
        ];
        let extended = store.extend(&held, Duration::from_secs(5)).await.unwrap();
        assert_eq!(extended, 1);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let store = MemoryLockStore::new();
        store.fail_next_claims(1);
        assert!(store.claim("ns__a", "t1", Duration::from_secs(5)).await.is_err());
        assert!(store.claim("ns__a", "t1", Duration::from_secs(5)).await.is_ok());
    }
}
