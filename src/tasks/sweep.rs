//! Expiry Sweep Task
//!
//! Background task that periodically evicts expired in-process entries, so
//! entries that are never read again do not accumulate.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::MemoryStore;

/// Spawns a background task that sweeps expired entries from `store`.
///
/// The write lock is taken only for the synchronous sweep and released
/// before the task waits for the next tick.
///
/// # Arguments
/// * `store` - Shared in-process store
/// * `sweep_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, to be aborted during shutdown.
///
/// # Example
/// ```ignore
/// let cache = CacheService::in_process();
/// let sweep_handle = spawn_sweep_task(cache.memory_store(), 60);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(store: Arc<RwLock<MemoryStore>>, sweep_interval_secs: u64) -> JoinHandle<()> {
    let period = Duration::from_secs(sweep_interval_secs.max(1));

    tokio::spawn(async move {
        info!(interval_secs = period.as_secs(), "Starting in-process expiry sweep");

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let (removed, remaining) = {
                let mut guard = store.write().await;
                let removed = guard.cleanup_expired();
                (removed, guard.len())
            };

            if removed > 0 {
                info!(removed, remaining, "Expiry sweep removed entries");
            } else {
                debug!(remaining, "Expiry sweep found nothing to remove");
            }
        }
    })
}
