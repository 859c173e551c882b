use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use super::entry::{CacheKey, Entry};
use super::{MetricReader, ReaderError, ReaderResult};

type Slot = Arc<OnceCell<Arc<[Arc<Entry>]>>>;

/// Exact-interval memoization in front of another reader.
///
/// Successful results are kept for the life of the process; failures are
/// never stored. Concurrent reads of the same key share one upstream read.
/// Each call hands out a fresh `Vec`, but the `Entry` values inside it are
/// shared with the cache: a shallow copy, not deep isolation.
pub struct MemoizedReader<R: MetricReader> {
    inner: R,
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl<R: MetricReader> MemoizedReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Number of keys with a stored result.
    #[cfg(test)]
    pub async fn cached_len(&self) -> usize {
        self.slots
            .lock()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    async fn slot(&self, key: CacheKey) -> Slot {
        let mut slots = self.slots.lock().await;
        slots.entry(key).or_default().clone()
    }
}

#[async_trait]
impl<R: MetricReader> MetricReader for MemoizedReader<R> {
    async fn read(
        &self,
        asset_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ReaderResult<Vec<Arc<Entry>>> {
        let slot = self.slot(CacheKey::new(asset_id, start, end)).await;
        if slot.initialized() {
            debug!(asset_id, %start, %end, "memo hit");
        }

        let cached = slot
            .get_or_try_init(|| async {
                let entries = self.inner.read(asset_id, start, end).await?;
                Ok::<_, ReaderError>(Arc::from(entries))
            })
            .await?;

        Ok(cached.to_vec())
    }
}
