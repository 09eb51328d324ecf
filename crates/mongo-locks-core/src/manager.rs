//! Store-generic lock manager.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{Span, instrument};
use uuid::Uuid;

use crate::error::{LockError, LockResult};
use crate::fork::ForkGuard;
use crate::heartbeat::Heartbeat;
use crate::options::{LockManagerOptions, NAMESPACE_SEPARATOR};
use crate::registry::LockRegistry;
use crate::store::LockStore;

/// Manages lease-based distributed locks against a shared store.
///
/// One manager instance owns a registry of the leases it currently holds
/// and a single background heartbeat task that renews all of them. Share
/// it across tasks behind an `Arc`; all operations take `&self`.
///
/// # Example
///
/// ```rust,ignore
/// let manager = LockManager::new(store, LockManagerOptions::new("my_project"))?;
/// if manager.acquire("nightly-sync").await? {
///     run_nightly_sync().await;
///     manager.release("nightly-sync").await?;
/// }
/// ```
pub struct LockManager<S: LockStore> {
    store: Arc<S>,
    options: LockManagerOptions,
    registry: Arc<LockRegistry>,
    heartbeat: Heartbeat,
    fork_guard: ForkGuard,
}

impl<S: LockStore> LockManager<S> {
    /// Creates a manager over `store`.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Configuration`] for an empty namespace or a
    /// zero lease duration / poll interval.
    pub fn new(store: S, options: LockManagerOptions) -> LockResult<Self> {
        options.validate()?;
        Ok(Self {
            store: Arc::new(store),
            options,
            registry: Arc::new(LockRegistry::default()),
            heartbeat: Heartbeat::default(),
            fork_guard: ForkGuard::default(),
        })
    }

    /// Returns the manager configuration.
    pub fn options(&self) -> &LockManagerOptions {
        &self.options
    }

    /// Whether this instance currently holds the lease for `key`.
    pub fn holds(&self, key: &str) -> bool {
        self.registry.contains(&self.namespaced(key))
    }

    /// Attempts to acquire the lease for `key` with a single atomic
    /// conditional write.
    ///
    /// Returns `Ok(true)` when this call won the lease and `Ok(false)` when
    /// a live lease is held elsewhere or a concurrent caller won the race.
    /// The store's single-document write ordering is the sole tie-break; a
    /// uniqueness conflict from the store is a lost race, not an error.
    ///
    /// In disabled mode this always returns `Ok(true)` without contacting
    /// the store.
    ///
    /// # Errors
    ///
    /// [`LockError::InvalidKey`] for an empty key, [`LockError::ForkViolation`]
    /// if the process was duplicated after the heartbeat daemon started,
    /// and [`LockError::Store`] for store connectivity failures.
    #[instrument(skip(self), fields(lock.key = %key, namespace = %self.options.namespace))]
    pub async fn acquire(&self, key: &str) -> LockResult<bool> {
        if self.options.disabled {
            return Ok(true);
        }
        if key.is_empty() {
            return Err(LockError::InvalidKey("key cannot be empty".to_string()));
        }
        self.fork_guard.check()?;

        let id = self.namespaced(key);
        let token = Uuid::new_v4().to_string();

        let result = self
            .store
            .claim(&id, &token, self.options.lease_duration)
            .await?;

        if let Some(record) = result
            && record.holder_token == token
        {
            self.registry.insert(id, token);
            if self.heartbeat.ensure_started(
                self.store.clone(),
                self.registry.clone(),
                self.options.lease_duration,
            ) {
                self.fork_guard.arm();
            }
            Span::current().record("acquired", true);
            return Ok(true);
        }

        Span::current().record("acquired", false);
        Ok(false)
    }

    /// Acquires `key`, polling at the configured interval until `wait_for`
    /// elapses.
    ///
    /// Gives up and returns `Ok(false)` once the deadline passes; there is
    /// no cancellation of an in-flight attempt, only of the wait between
    /// attempts.
    #[instrument(skip(self), fields(lock.key = %key, namespace = %self.options.namespace, wait_for = ?wait_for))]
    pub async fn acquire_within(&self, key: &str, wait_for: Duration) -> LockResult<bool> {
        let deadline = Instant::now() + wait_for;
        loop {
            if self.acquire(key).await? {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(self.options.poll_interval.min(deadline - now)).await;
        }
    }

    /// Releases the lease for `key`.
    ///
    /// The delete is guarded by the holder token recorded at acquisition:
    /// if the lease expired and was taken over in the interim, the
    /// successor's record is left alone. Releasing twice or releasing a
    /// key this instance never held is a no-op.
    #[instrument(skip(self), fields(lock.key = %key, namespace = %self.options.namespace))]
    pub async fn release(&self, key: &str) -> LockResult<()> {
        if self.options.disabled {
            return Ok(());
        }
        let id = self.namespaced(key);
        if let Some(token) = self.registry.remove(&id) {
            self.store.release(&id, &token).await?;
        }
        Ok(())
    }

    /// Stops the heartbeat daemon and, when `release_held` is set,
    /// releases every lease this instance holds.
    ///
    /// Without `release_held` the held records simply stop being renewed
    /// and expire naturally. The manager must not be used for further
    /// acquisitions after shutdown.
    pub async fn shutdown(&self, release_held: bool) -> LockResult<()> {
        self.heartbeat.abort();
        if release_held {
            for lease in self.registry.drain() {
                self.store.release(&lease.id, &lease.token).await?;
            }
        }
        Ok(())
    }

    /// Whether the heartbeat daemon has been started.
    pub fn heartbeat_running(&self) -> bool {
        self.heartbeat.is_running()
    }

    pub(crate) fn namespaced(&self, key: &str) -> String {
        format!("{}{}{}", self.options.namespace, NAMESPACE_SEPARATOR, key)
    }

    /// Drops the registry entry for `key` without touching the store,
    /// leaving the lease to expire. Returns whether an entry existed.
    pub(crate) fn forget(&self, key: &str) -> bool {
        self.registry.remove(&self.namespaced(key)).is_some()
    }
}
