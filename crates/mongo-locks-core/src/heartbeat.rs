//! Background lease renewal.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::registry::LockRegistry;
use crate::store::LockStore;

/// Renewal attempts per cycle before the cycle is abandoned.
const RENEWAL_ATTEMPTS: u32 = 3;

/// Base for the linearly increasing retry backoff.
const RENEWAL_BACKOFF: Duration = Duration::from_millis(250);

/// Heartbeat daemon state: `{not started}` until the first successful
/// acquisition of the manager's lifetime, `{running}` afterwards. There is
/// no transition back.
#[derive(Debug, Default)]
pub(crate) struct Heartbeat {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Heartbeat {
    /// Lazily spawns the renewal task. Returns `true` when this call
    /// actually started it.
    pub(crate) fn ensure_started<S: LockStore>(
        &self,
        store: Arc<S>,
        registry: Arc<LockRegistry>,
        lease: Duration,
    ) -> bool {
        let mut task = self.task.lock().expect("heartbeat state poisoned");
        if task.is_some() {
            return false;
        }
        let cadence = lease / 3;
        debug!(cadence_ms = cadence.as_millis() as u64, "starting heartbeat daemon");
        *task = Some(tokio::spawn(renewal_loop(store, registry, lease, cadence)));
        true
    }

    pub(crate) fn is_running(&self) -> bool {
        self.task.lock().expect("heartbeat state poisoned").is_some()
    }

    /// Aborts the renewal task if it is running.
    pub(crate) fn abort(&self) {
        if let Some(task) = self.task.lock().expect("heartbeat state poisoned").take() {
            task.abort();
        }
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Runs for the remaining life of the process unless aborted. Every cycle
/// snapshots the registry and extends all held leases in one bulk write.
async fn renewal_loop<S: LockStore>(
    store: Arc<S>,
    registry: Arc<LockRegistry>,
    lease: Duration,
    cadence: Duration,
) {
    let mut interval = tokio::time::interval(cadence);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; skip it so the first renewal lands
    // one cadence after acquisition.
    interval.tick().await;

    loop {
        interval.tick().await;

        let held = registry.snapshot();
        if held.is_empty() {
            continue;
        }

        renew_once(store.as_ref(), &held, lease).await;
    }
}

/// One renewal cycle: a bulk extension with bounded retries. A cycle that
/// exhausts its retries is abandoned and logged; the worst outcome is a
/// lease expiring and being taken over, which the design tolerates.
async fn renew_once<S: LockStore>(store: &S, held: &[crate::store::HeldLease], lease: Duration) {
    for attempt in 1..=RENEWAL_ATTEMPTS {
        match store.extend(held, lease).await {
            Ok(extended) => {
                trace!(held = held.len(), extended, "extended leases");
                if (extended as usize) < held.len() {
                    debug!(
                        held = held.len(),
                        extended,
                        "some leases no longer match their token; they were released or taken over"
                    );
                }
                return;
            }
            Err(error) if attempt < RENEWAL_ATTEMPTS => {
                debug!(%error, attempt, "lease renewal failed, retrying");
                tokio::time::sleep(RENEWAL_BACKOFF * attempt).await;
            }
            Err(error) => {
                warn!(%error, held = held.len(), "lease renewal failed, abandoning cycle");
            }
        }
    }
}
