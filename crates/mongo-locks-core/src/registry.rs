//! In-memory registry of leases held by this manager instance.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::store::HeldLease;

/// Set of leases currently held by one manager instance.
///
/// Written by the public API on acquire/release and read by the heartbeat
/// daemon on every renewal cycle, so membership is guarded by a mutex.
#[derive(Debug, Default)]
pub(crate) struct LockRegistry {
    held: Mutex<HashMap<String, String>>,
}

impl LockRegistry {
    /// Records a won lease.
    pub(crate) fn insert(&self, id: String, token: String) {
        self.held.lock().expect("registry poisoned").insert(id, token);
    }

    /// Removes a lease, returning the token it was acquired with.
    pub(crate) fn remove(&self, id: &str) -> Option<String> {
        self.held.lock().expect("registry poisoned").remove(id)
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.held.lock().expect("registry poisoned").contains_key(id)
    }

    /// Snapshot of all held leases for a renewal cycle.
    pub(crate) fn snapshot(&self) -> Vec<HeldLease> {
        self.held
            .lock()
            .expect("registry poisoned")
            .iter()
            .map(|(id, token)| HeldLease {
                id: id.clone(),
                token: token.clone(),
            })
            .collect()
    }

    /// Removes and returns every held lease.
    pub(crate) fn drain(&self) -> Vec<HeldLease> {
        self.held
            .lock()
            .expect("registry poisoned")
            .drain()
            .map(|(id, token)| HeldLease { id, token })
            .collect()
    }
}
