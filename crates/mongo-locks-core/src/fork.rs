//! Fork-safety guard.
//!
//! The heartbeat daemon is a tokio task and is not duplicated when the
//! process is. A duplicated process would otherwise keep acquiring leases
//! that nothing renews, so the guard records the owning pid when the daemon
//! starts and fails fast on any later mismatch.

use std::sync::OnceLock;

use crate::error::{LockError, LockResult};

#[derive(Debug, Default)]
pub(crate) struct ForkGuard {
    recorded: OnceLock<u32>,
}

impl ForkGuard {
    /// Records the current process identity. Called once, at the moment
    /// the heartbeat daemon first starts. Later calls are no-ops.
    pub(crate) fn arm(&self) {
        let _ = self.recorded.set(std::process::id());
    }

    /// Fails if the process was duplicated since the guard was armed.
    /// Before arming there is no running daemon to lose, so any pid is fine.
    pub(crate) fn check(&self) -> LockResult<()> {
        self.check_pid(std::process::id())
    }

    fn check_pid(&self, current: u32) -> LockResult<()> {
        match self.recorded.get() {
            Some(&recorded) if recorded != current => {
                Err(LockError::ForkViolation { recorded, current })
            }
            _ => Ok(()),
        }
    }
}
