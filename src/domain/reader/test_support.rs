//! Fake upstream shared by the reader tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, DurationRound, NaiveDate, TimeZone, Utc};
use reqwest::Url;

use super::entry::{Entry, Page};
use super::time_range::TimeRange;
use super::{PageFetcher, ReaderError, ReaderResult};

pub(crate) const API_KEY: &str = "apiKey";
pub(crate) const ASSET_ID: &str = "assetId";
pub(crate) const ENTRIES_PER_PAGE: usize = 100;

pub(crate) fn midnight() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2017, 6, 20, 0, 0, 0).unwrap()
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2017, 6, 20, 12, 0, 0).unwrap()
}

/// Empty entries every hour on the hour in `[start, end)`.
pub(crate) fn hourly(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Arc<Entry>> {
    let mut current = start.duration_trunc(Duration::hours(1)).unwrap();
    if current < start {
        current += Duration::hours(1);
    }
    let mut result = Vec::new();
    while current < end {
        result.push(Arc::new(Entry::new(current)));
        current += Duration::hours(1);
    }
    result
}

/// Serves hourly samples for every window relative to its own clock,
/// `ENTRIES_PER_PAGE` per page.
pub(crate) struct FakeCloudHealth {
    pub current_time: DateTime<Utc>,
    pub api_key: String,
    pub asset_id: String,
    pub call_count: AtomicUsize,
    batch_dates: Mutex<VecDeque<NaiveDate>>,
}

impl FakeCloudHealth {
    pub fn new(current_time: DateTime<Utc>) -> Self {
        Self {
            current_time,
            api_key: API_KEY.to_string(),
            asset_id: ASSET_ID.to_string(),
            call_count: AtomicUsize::new(0),
            batch_dates: Mutex::new(VecDeque::new()),
        }
    }

    /// Batch dates reported by successive calls; the last one sticks.
    pub fn with_batch_dates(self, dates: Vec<NaiveDate>) -> Self {
        *self.batch_dates.lock().unwrap() = dates.into();
        self
    }

    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn next_batch_date(&self) -> NaiveDate {
        let mut dates = self.batch_dates.lock().unwrap();
        let scripted = if dates.len() > 1 {
            dates.pop_front()
        } else {
            dates.front().copied()
        };
        scripted.unwrap_or_else(|| self.current_time.date_naive())
    }

    fn window(&self, time_range: &str) -> ReaderResult<Vec<Arc<Entry>>> {
        let midnight = self
            .current_time
            .duration_trunc(Duration::days(1))
            .unwrap();
        if time_range == TimeRange::Today.as_str() {
            return Ok(hourly(midnight, self.current_time));
        }
        let span = [
            TimeRange::Yesterday,
            TimeRange::Last2Days,
            TimeRange::Last7Days,
            TimeRange::Last14Days,
            TimeRange::Last31Days,
        ]
        .iter()
        .find(|r| r.as_str() == time_range)
        .and_then(|r| r.span())
        .ok_or_else(|| ReaderError::Upstream {
            status: 400,
            body: format!("time range '{}' not recognised.", time_range),
        })?;
        Ok(hourly(midnight - span, midnight))
    }
}

#[async_trait]
impl PageFetcher for FakeCloudHealth {
    async fn fetch(&self, raw_url: &str) -> ReaderResult<Page> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let mut url = Url::parse(raw_url).map_err(|e| ReaderError::Transport(e.to_string()))?;
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let param = |key: &str| params.get(key).map(String::as_str).unwrap_or("");

        if param("api_key") != self.api_key {
            return Err(ReaderError::Upstream {
                status: 401,
                body: format!("Expected API key '{}', got '{}'", self.api_key, param("api_key")),
            });
        }
        if param("asset") != self.asset_id {
            return Err(ReaderError::Upstream {
                status: 404,
                body: format!("Expected asset '{}', got '{}'", self.asset_id, param("asset")),
            });
        }

        let all = self.window(param("time_range"))?;
        // Pages are 1-based; absent or 0 is the first page.
        let page: usize = param("page").parse().unwrap_or(0).max(1);
        let lo = ((page - 1) * ENTRIES_PER_PAGE).min(all.len());
        let hi = (page * ENTRIES_PER_PAGE).min(all.len());

        let next = if hi < all.len() {
            let kept: Vec<(String, String)> =
                params.into_iter().filter(|(k, _)| k != "page").collect();
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept)
                .append_pair("page", &(page + 1).to_string());
            Some(url.to_string())
        } else {
            None
        };

        Ok(Page {
            entries: all[lo..hi].to_vec(),
            next,
            batch_date: Some(self.next_batch_date()),
        })
    }
}
