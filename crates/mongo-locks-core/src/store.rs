//! Store contract for lock backends.

use std::future::Future;
use std::time::{Duration, SystemTime};

use crate::error::LockResult;

/// A persisted lock record, one per namespaced key.
///
/// The record is owned by no single process: it lives in the shared store
/// and whoever's token is currently written in it holds the lease. A record
/// is *live* while `expires_at` is in the future; afterwards it is stale
/// and eligible for takeover by any caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRecord {
    /// Namespaced identifier (`{namespace}__{key}`).
    pub id: String,
    /// Random value identifying the current acquisition generation.
    pub holder_token: String,
    /// Absolute expiration timestamp of the lease.
    pub expires_at: SystemTime,
}

impl LockRecord {
    /// Whether the lease is still live.
    pub fn is_live(&self) -> bool {
        self.expires_at > SystemTime::now()
    }
}

/// A lease held by this process: the namespaced id plus the holder token
/// generated at acquisition time. Lives only in the manager's registry,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldLease {
    pub id: String,
    pub token: String,
}

/// Contract a document store must satisfy to back the lock manager.
///
/// The store is the sole arbiter of mutual exclusion: `claim` must be a
/// single atomic conditional write, and the atomicity the store guarantees
/// for one document is the only consensus this system relies on.
pub trait LockStore: Send + Sync + 'static {
    /// Atomically claims the lease for `id`.
    ///
    /// In one conditional write: if no record exists for `id`, or the
    /// existing record has expired, replace it with
    /// `{expires_at: now + lease, holder_token: token}`; otherwise leave
    /// the record untouched. Returns the post-write record from the same
    /// atomic step so the caller can tell whether its token won.
    ///
    /// Returns `Ok(None)` when the store raised a uniqueness conflict for
    /// the record id — a lost race, never an error.
    fn claim(
        &self,
        id: &str,
        token: &str,
        lease: Duration,
    ) -> impl Future<Output = LockResult<Option<LockRecord>>> + Send;

    /// Deletes the record for `id` if its stored token still equals
    /// `token`. An absent record or a mismatched token is a no-op.
    fn release(&self, id: &str, token: &str) -> impl Future<Output = LockResult<()>> + Send;

    /// Extends every lease in `held` whose stored token still matches,
    /// setting `expires_at = now + lease`, in a single bulk conditional
    /// update. Returns how many records matched.
    fn extend(
        &self,
        held: &[HeldLease],
        lease: Duration,
    ) -> impl Future<Output = LockResult<u64>> + Send;

    /// Point lookup of the record for `id`.
    fn find(&self, id: &str) -> impl Future<Output = LockResult<Option<LockRecord>>> + Send;
}
