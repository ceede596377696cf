//! Short-lived snapshot cache.

use crate::model::Snapshot;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Reuses the last snapshot for a fixed time-to-live.
///
/// Scrapes that miss the cache wait on the same lock, so at most one
/// collection runs at a time and the others reuse its result.
pub struct ScrapeCache {
    ttl: Duration,
    slot: Mutex<Option<(Instant, Arc<Snapshot>)>>,
}

impl ScrapeCache {
    /// Creates an empty cache with the given time-to-live.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Returns the cached snapshot if fresh, otherwise runs `collect`.
    pub async fn get_or_collect<F, Fut>(&self, collect: F) -> Arc<Snapshot>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Snapshot>,
    {
        let mut slot = self.slot.lock().await;
        if let Some((taken_at, snapshot)) = slot.as_ref() {
            if taken_at.elapsed() < self.ttl {
                tracing::trace!(age_ms = taken_at.elapsed().as_millis() as u64, "Serving cached snapshot");
                return Arc::clone(snapshot);
            }
        }

        let snapshot = Arc::new(collect().await);
        *slot = Some((Instant::now(), Arc::clone(&snapshot)));
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MetricRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_reuses_fresh_snapshot() {
        let cache = ScrapeCache::new(Duration::from_secs(60));
        let collections = AtomicUsize::new(0);
        let counter = &collections;

        for _ in 0..3 {
            cache
                .get_or_collect(move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    MetricRegistry::new().finish()
                })
                .await;
        }
        assert_eq!(collections.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_snapshot_recollected() {
        let cache = ScrapeCache::new(Duration::from_millis(10));
        let collections = AtomicUsize::new(0);
        let counter = &collections;

        let collect = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            MetricRegistry::new().finish()
        };
        cache.get_or_collect(collect).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.get_or_collect(collect).await;

        assert_eq!(collections.load(Ordering::SeqCst), 2);
    }
}
