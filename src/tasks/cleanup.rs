//! Cache Sweep Task
//!
//! Expired specs are already skipped lazily on read; this task additionally
//! frees their memory at a fixed interval.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SpecCache;

/// Spawns a background task that periodically purges expired cached specs.
///
/// # Arguments
/// * `caches` - Spec caches to sweep
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_cleanup_task(caches: Vec<SpecCache>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting spec cache sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let mut removed = 0;
            for cache in &caches {
                removed += cache.cleanup_expired().await;
            }

            if removed > 0 {
                info!("Spec cache sweep: removed {} expired entries", removed);
            } else {
                debug!("Spec cache sweep: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::key::EntryKey;
    use crate::table::{MemoryBackend, Table, RULE_FIELDS};

    fn cache(ttl: Duration) -> SpecCache {
        let table = Table::new(
            Arc::new(MemoryBackend::new()),
            "rules",
            RULE_FIELDS,
            Duration::from_secs(5),
        );
        SpecCache::new(table, 100, ttl)
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let cache = cache(Duration::from_millis(200));
        cache.read(&EntryKey::new("o", "short")).await.unwrap();
        assert_eq!(cache.stats().await.total_entries, 1);

        let handle = spawn_cleanup_task(vec![cache.clone()], 1);

        // Wait for entry to expire and a sweep to run
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(cache.stats().await.total_entries, 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let cache = cache(Duration::from_secs(3600));
        cache.read(&EntryKey::new("o", "long")).await.unwrap();

        let handle = spawn_cleanup_task(vec![cache.clone()], 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(cache.stats().await.total_entries, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(vec![cache(Duration::from_secs(1))], 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
