//! Convenience prelude for lock manager types.

pub use crate::error::{LockError, LockResult};
pub use crate::manager::LockManager;
pub use crate::memory::MemoryLockStore;
pub use crate::options::LockManagerOptions;
pub use crate::scope::{ScopeOptions, ScopedLock};
pub use crate::store::{HeldLease, LockRecord, LockStore};
