//! Manager configuration.

use std::time::Duration;

use crate::error::{LockError, LockResult};

/// Separator between the namespace and the caller-supplied key.
pub const NAMESPACE_SEPARATOR: &str = "__";

/// Configuration for a [`LockManager`](crate::manager::LockManager).
#[derive(Debug, Clone)]
pub struct LockManagerOptions {
    /// Prefix applied to every lock key acquired through this manager.
    pub namespace: String,
    /// How long an acquired lease is valid without renewal. Should be
    /// longer than the expected duration of a heartbeat round trip.
    pub lease_duration: Duration,
    /// When set, every acquire succeeds immediately with no store access.
    /// Intended for single-process or development contexts.
    pub disabled: bool,
    /// Interval between attempts when waiting for a lock with a deadline.
    pub poll_interval: Duration,
}

impl LockManagerOptions {
    /// Creates options for the given namespace with defaults:
    /// 60 second leases, enabled, 100ms wait polling.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            lease_duration: Duration::from_secs(60),
            disabled: false,
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Sets the lease duration.
    pub fn lease_duration(mut self, lease: Duration) -> Self {
        self.lease_duration = lease;
        self
    }

    /// Disables locking entirely.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Sets the polling interval for bounded waits.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub(crate) fn validate(&self) -> LockResult<()> {
        if self.namespace.is_empty() {
            return Err(LockError::Configuration(
                "namespace cannot be empty".to_string(),
            ));
        }
        if self.lease_duration.is_zero() {
            return Err(LockError::Configuration(
                "lease duration must be positive".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(LockError::Configuration(
                "poll interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
