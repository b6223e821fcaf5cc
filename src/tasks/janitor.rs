//! Janitor Task
//!
//! Background task that periodically removes cache entries whose `date`
//! header is older than the TTL. Entries without a readable `date` header
//! are never expired.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheStorage, SharedStats};
use crate::error::Result;

/// Time between sweeps.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Entries older than this are deleted.
pub const MAX_ENTRY_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Sweeps every partition once, as of `now`.
///
/// Returns the number of entries deleted. Failing to enumerate partitions
/// aborts the sweep; a failure inside one partition only skips that entry
/// or partition.
pub async fn sweep_expired(storage: &dyn CacheStorage, now: DateTime<Utc>) -> Result<usize> {
    let mut removed = 0;

    for partition in storage.partitions().await? {
        let keys = match storage.keys(&partition).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(partition = %partition, error = %e, "failed to list partition");
                continue;
            }
        };

        for key in keys {
            let response = match storage.lookup(&partition, &key).await {
                Ok(Some(response)) => response,
                Ok(None) => continue,
                Err(e) => {
                    warn!(partition = %partition, key = %key, error = %e, "failed to read entry");
                    continue;
                }
            };

            let Some(date) = response.date() else {
                continue;
            };

            // A date in the future yields a negative age and is kept.
            let expired = (now - date)
                .to_std()
                .is_ok_and(|age| age > MAX_ENTRY_AGE);
            if !expired {
                continue;
            }

            match storage.delete_entry(&partition, &key).await {
                Ok(true) => {
                    debug!(partition = %partition, key = %key, "expired entry removed");
                    removed += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(partition = %partition, key = %key, error = %e, "failed to delete entry")
                }
            }
        }
    }

    Ok(removed)
}

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// The first sweep runs one interval after the task starts. The returned
/// handle is aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let storage: Arc<dyn CacheStorage> = Arc::new(MemoryStorage::new());
/// let handle = spawn_janitor_task(storage, SharedStats::default(), SWEEP_INTERVAL);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_janitor_task(
    storage: Arc<dyn CacheStorage>,
    stats: SharedStats,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cache janitor with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            match sweep_expired(storage.as_ref(), Utc::now()).await {
                Ok(0) => debug!("Janitor: no expired entries found"),
                Ok(removed) => {
                    stats.write().await.record_expired(removed);
                    info!("Janitor: removed {} expired entries", removed);
                }
                Err(e) => warn!(error = %e, "Janitor sweep failed"),
            }
        }
    })
}
