//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::{CacheBackend, CacheStats};

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task only holds a weak reference to the cache and stops on its own
/// once the cache has been dropped. Backend failures are logged and the
/// next sweep is attempted as usual.
///
/// # Arguments
/// * `cache` - Weak reference to the backend to sweep
/// * `stats` - Counters to record evictions in
/// * `interval` - Time between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which the owning wrapper aborts when
/// it is dropped.
pub fn spawn_sweeper<V>(
    cache: Weak<dyn CacheBackend<V>>,
    stats: Arc<Mutex<CacheStats>>,
    interval: Duration,
) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting TTL sweep task with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let Some(cache) = cache.upgrade() else {
                debug!("TTL sweep: cache dropped, stopping");
                break;
            };

            match cache.remove_expired(Instant::now()).await {
                Ok(removed) if !removed.is_empty() => {
                    stats.lock().await.record_evictions(removed.len());
                    info!("TTL sweep: removed {} expired entries", removed.len());
                }
                Ok(_) => debug!("TTL sweep: no expired entries found"),
                Err(err) => warn!(error = %err, "TTL sweep failed"),
            }
        }
    })
}
