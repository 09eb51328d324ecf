//! Scoped acquisition and higher-order wrapping.
//!
//! Two orthogonal primitives: [`ScopedLock`], a guard that reports whether
//! the lock was granted and releases it on the way out, and
//! [`LockManager::with_lock`], which runs an async callable only while the
//! guard grants access. Wrapping a callable in further layers is ordinary
//! function composition.

use std::future::Future;
use std::time::Duration;

use crate::error::{LockError, LockResult};
use crate::manager::LockManager;
use crate::store::LockStore;

/// Options for scoped acquisition.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeOptions {
    /// Surface a failed acquisition as [`LockError::LockFailure`] instead
    /// of a skipped region.
    pub raise_on_failure: bool,
    /// Poll for the lock until this deadline instead of attempting once.
    pub wait_for: Option<Duration>,
}

impl ScopeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise [`LockError::LockFailure`] when the lock cannot be acquired.
    pub fn raise_on_failure(mut self) -> Self {
        self.raise_on_failure = true;
        self
    }

    /// Keep polling for the lock for up to `wait`.
    pub fn wait_for(mut self, wait: Duration) -> Self {
        self.wait_for = Some(wait);
        self
    }
}

/// Guard over a protected region.
///
/// Obtained from [`LockManager::lock_scope`]. Check [`acquired`](Self::acquired)
/// before entering the protected region, and call [`release`](Self::release)
/// on the way out. If the guard is dropped while still holding the lease,
/// the lease stops being renewed and expires naturally — the same
/// self-healing path as a crashed holder.
#[must_use = "check acquired() and release() the guard after the protected region"]
pub struct ScopedLock<'a, S: LockStore> {
    manager: &'a LockManager<S>,
    key: String,
    acquired: bool,
    released: bool,
}

impl<S: LockStore> ScopedLock<'_, S> {
    /// Whether the lock was granted to this guard.
    pub fn acquired(&self) -> bool {
        self.acquired
    }

    /// Releases the lease if this guard holds it.
    pub async fn release(mut self) -> LockResult<()> {
        self.released = true;
        if self.acquired {
            self.manager.release(&self.key).await?;
        }
        Ok(())
    }
}

impl<S: LockStore> Drop for ScopedLock<'_, S> {
    fn drop(&mut self) {
        // No async context here, so the record cannot be deleted. Dropping
        // the registry entry stops renewal and the lease expires on its own.
        if self.acquired && !self.released && self.manager.forget(&self.key) {
            tracing::debug!(lock.key = %self.key, "scoped lock dropped without release, lease left to expire");
        }
    }
}

impl<S: LockStore> LockManager<S> {
    /// Acquires `key` for a protected region.
    ///
    /// With [`ScopeOptions::raise_on_failure`], a failed acquisition
    /// returns [`LockError::LockFailure`] before the protected region can
    /// run; otherwise the returned guard reports the outcome and the
    /// caller is responsible for skipping its own logic.
    pub async fn lock_scope(&self, key: &str, options: ScopeOptions) -> LockResult<ScopedLock<'_, S>> {
        let acquired = match options.wait_for {
            Some(wait) => self.acquire_within(key, wait).await?,
            None => self.acquire(key).await?,
        };
        if !acquired && options.raise_on_failure {
            return Err(LockError::LockFailure(key.to_string()));
        }
        Ok(ScopedLock {
            manager: self,
            key: key.to_string(),
            acquired,
            released: false,
        })
    }

    /// Runs `f` only while the lock for `key` is held, releasing on every
    /// exit path.
    ///
    /// Returns `Ok(None)` when the lock was not acquired (unless
    /// `raise_on_failure` turned that into an error), `Ok(Some(output))`
    /// otherwise. An error value returned by `f` propagates through the
    /// output after the lease is released.
    pub async fn with_lock<F, Fut, T>(
        &self,
        key: &str,
        options: ScopeOptions,
        f: F,
    ) -> LockResult<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let guard = self.lock_scope(key, options).await?;
        if !guard.acquired() {
            return Ok(None);
        }
        let output = f().await;
        guard.release().await?;
        Ok(Some(output))
    }
}

/// Runs a callee under a lock named after the callee itself.
///
/// `locked!(manager, sync)` acquires the key `"sync"`, awaits `sync()`
/// while the lease is held, and releases it afterwards. An explicit
/// [`ScopeOptions`] can be passed as a third argument.
///
/// ```rust,ignore
/// async fn sync() { /* protected */ }
///
/// locked!(manager, sync).await?;
/// locked!(manager, sync, ScopeOptions::new().raise_on_failure()).await?;
/// ```
#[macro_export]
macro_rules! locked {
    ($manager:expr, $callee:ident) => {
        $manager.with_lock(stringify!($callee), $crate::ScopeOptions::default(), || $callee())
    };
    ($manager:expr, $callee:ident, $options:expr) => {
        $manager.with_lock(stringify!($callee), $options, || $callee())
    };
}
