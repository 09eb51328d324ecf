//! Error types for lock operations.

use thiserror::Error;

/// Errors that can occur during lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// The lock could not be acquired and the caller opted into an error.
    ///
    /// A lost race normally surfaces as `Ok(false)`; this variant is only
    /// produced by scoped acquisition with `raise_on_failure` set.
    #[error("failed to acquire lock '{0}'")]
    LockFailure(String),

    /// Invalid lock key (empty keys are rejected).
    #[error("invalid lock key: {0}")]
    InvalidKey(String),

    /// Invalid manager configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The process was duplicated after the heartbeat daemon started.
    ///
    /// The duplicate does not inherit the running daemon, so any lease it
    /// thinks it holds is not being renewed. Using the manager from the
    /// duplicate is a fatal usage error.
    #[error("process duplicated after heartbeat start (recorded pid {recorded}, current pid {current})")]
    ForkViolation { recorded: u32, current: u32 },

    /// Backing store error.
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LockError {
    /// Wraps a backend error as a store error.
    pub fn store<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Store(Box::new(err))
    }
}

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;
