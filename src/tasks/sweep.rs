//! Expiry Sweep Task
//!
//! Background task that periodically purges stale cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedLruCache;

/// Spawns a background task that periodically purges stale cache entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between runs,
/// and holds the cache lock only for the purge itself. Pending waiters are
/// never touched.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache = LruCache::<String>::new(CacheOptions::default()).into_shared();
/// let sweep_handle = spawn_sweep_task(cache.clone(), Duration::from_secs(30));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<T>(cache: SharedLruCache<T>, interval: Duration) -> JoinHandle<()>
where
    T: Send + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {}ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.lock().await.purge_expired();

            if removed > 0 {
                info!("Expiry sweep: removed {} stale entries", removed);
            } else {
                debug!("Expiry sweep: no stale entries found");
            }
        }
    })
}
