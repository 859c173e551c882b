//! Reads historical per-asset metrics out of the upstream's fixed lookback
//! windows and answers exact half-open `[start, end)` queries.

pub mod entry;
pub mod error;
pub mod memoized_reader;
pub mod read_orchestrator;
pub mod skew_guard;
pub mod time_range;
pub mod window_fetcher;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use entry::{Entry, Page};
pub use error::{ReaderError, ReaderResult};
pub use memoized_reader::MemoizedReader;
pub use read_orchestrator::ChReader;

pub const DEFAULT_BASE_URL: &str = "https://chapi.cloudhealthtech.com/metrics/v1";
pub const DEFAULT_MAX_DAY_ROLLOVERS: u32 = 3;

/// Source of the current time. Tests pin it; production uses `Utc::now`.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Fetches and decodes a single page of the upstream metrics API.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> ReaderResult<Page>;
}

/// Reads the metrics of one asset with `start` inclusive and `end` exclusive.
///
/// Asset ids are opaque, e.g. `arn:aws:ec2:us-east-1:12345678901:instance/i-12345678`.
/// Callers holding instants in another offset convert with
/// `with_timezone(&Utc)` first.
#[async_trait]
pub trait MetricReader: Send + Sync {
    async fn read(
        &self,
        asset_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ReaderResult<Vec<Arc<Entry>>>;
}

#[async_trait]
impl<R: MetricReader + ?Sized> MetricReader for Arc<R> {
    async fn read(
        &self,
        asset_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ReaderResult<Vec<Arc<Entry>>> {
        (**self).read(asset_id, start, end).await
    }
}

#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub api_key: String,
    pub base_url: String,
    /// How many times a read may restart because the upstream day changed.
    pub max_day_rollovers: u32,
}

impl ReaderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_day_rollovers: DEFAULT_MAX_DAY_ROLLOVERS,
        }
    }
}
