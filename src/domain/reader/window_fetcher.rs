use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::entry::{Entry, Page};
use super::error::FetchError;
use super::skew_guard::SkewGuard;
use super::time_range::TimeRange;
use super::{PageFetcher, ReaderConfig};

/// How a window fetch covered the requested interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Saw data at/before `start` and at/after `end`.
    Complete,
    /// Reached back to `start` but never saw anything at/after `end`.
    NeedsSupplement,
    /// The first sample came after `start`. `reached_end` is false when the
    /// fetch bailed out before paging.
    NeedsWider { reached_end: bool },
}

impl FetchOutcome {
    fn from_flags(covers_left: bool, covers_right: bool) -> Self {
        match (covers_left, covers_right) {
            (true, true) => FetchOutcome::Complete,
            (true, false) => FetchOutcome::NeedsSupplement,
            (false, reached_end) => FetchOutcome::NeedsWider { reached_end },
        }
    }

    pub fn covers_left(&self) -> bool {
        !matches!(self, FetchOutcome::NeedsWider { .. })
    }

    pub fn covers_right(&self) -> bool {
        matches!(
            self,
            FetchOutcome::Complete | FetchOutcome::NeedsWider { reached_end: true }
        )
    }
}

/// Entries of one window trimmed to `[start, end)`, across all pages read.
#[derive(Debug)]
pub struct WindowBatch {
    pub entries: Vec<Arc<Entry>>,
    pub outcome: FetchOutcome,
}

/// Fetches one named window for one asset and pages through it.
pub struct WindowFetcher {
    pages: Arc<dyn PageFetcher>,
    base_url: String,
    api_key: String,
}

impl WindowFetcher {
    pub fn new(config: &ReaderConfig, pages: Arc<dyn PageFetcher>) -> Self {
        Self {
            pages,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// First-page URL for `range`. Continuation pages come from the upstream.
    pub fn window_url(&self, asset_id: &str, range: TimeRange) -> String {
        format!(
            "{}?api_key={}&asset={}&time_range={}",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(asset_id),
            range.as_str()
        )
    }

    /// With `exit_early` set, gives up after the first page when it does not
    /// reach back to `start`, so the caller can escalate without paging.
    pub(crate) async fn fetch(
        &self,
        asset_id: &str,
        range: TimeRange,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        guard: &mut SkewGuard,
        exit_early: bool,
    ) -> Result<WindowBatch, FetchError> {
        let mut page = self
            .fetch_page(&self.window_url(asset_id, range), range, 1, guard)
            .await?;

        let covers_left = page.entries.first().is_some_and(|e| e.time <= start);
        if !covers_left && exit_early {
            debug!(asset_id, time_range = %range, "first sample is after start; exiting early");
            return Ok(WindowBatch {
                entries: Vec::new(),
                outcome: FetchOutcome::NeedsWider { reached_end: false },
            });
        }

        let mut entries = Vec::new();
        let mut covers_right = false;
        let mut page_no = 1;
        loop {
            let (lo, hi) = find_range(&page.entries, start, end);
            entries.extend_from_slice(&page.entries[lo..hi]);

            // Something at/after `end` was seen; later pages cannot matter.
            if hi < page.entries.len() {
                covers_right = true;
                break;
            }

            match page.next.take().filter(|next| !next.is_empty()) {
                Some(next) => {
                    page_no += 1;
                    page = self.fetch_page(&next, range, page_no, guard).await?;
                }
                None => break,
            }
        }

        let outcome = FetchOutcome::from_flags(covers_left, covers_right);
        debug!(
            asset_id,
            time_range = %range,
            pages = page_no,
            entries = entries.len(),
            ?outcome,
            "window fetched"
        );
        Ok(WindowBatch { entries, outcome })
    }

    async fn fetch_page(
        &self,
        url: &str,
        range: TimeRange,
        page_no: usize,
        guard: &mut SkewGuard,
    ) -> Result<Page, FetchError> {
        let page = self.pages.fetch(url).await?;
        debug!(time_range = %range, page = page_no, entries = page.entries.len(), "page fetched");

        if let Some(day) = page.batch_date {
            let previous = guard.last_batch_day();
            if guard.observe(day) {
                debug!(?previous, %day, time_range = %range, "upstream batch day changed");
                return Err(FetchError::DayRolledOver);
            }
        }
        Ok(page)
    }
}

/// Index of the first entry at/after `start` and, scanning on from there,
/// the first entry at/after `end`. A linear scan, since page order is not
/// guaranteed.
pub fn find_range(
    entries: &[Arc<Entry>],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> (usize, usize) {
    let len = entries.len();
    let mut lo = 0;
    while lo < len && entries[lo].time < start {
        lo += 1;
    }
    let mut hi = lo;
    while hi < len && entries[hi].time < end {
        hi += 1;
    }
    (lo, hi)
}
