use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use tracing::{debug, info, warn};

use super::entry::Entry;
use super::error::{FetchError, ReaderError, ReaderResult};
use super::skew_guard::SkewGuard;
use super::time_range::{select_time_range, TimeRange};
use super::window_fetcher::{FetchOutcome, WindowBatch, WindowFetcher};
use super::{system_clock, Clock, MetricReader, PageFetcher, ReaderConfig};

/// Answers exact `[start, end)` reads by stitching together the upstream's
/// relative windows, compensating for clock skew between us and upstream.
pub struct ChReader {
    fetcher: WindowFetcher,
    clock: Clock,
    max_day_rollovers: u32,
}

impl ChReader {
    pub fn new(config: &ReaderConfig, pages: Arc<dyn PageFetcher>) -> Self {
        Self::with_clock(config, pages, system_clock())
    }

    pub fn with_clock(config: &ReaderConfig, pages: Arc<dyn PageFetcher>, clock: Clock) -> Self {
        Self {
            fetcher: WindowFetcher::new(config, pages),
            clock,
            max_day_rollovers: config.max_day_rollovers,
        }
    }

    /// One attempt. Any day rollover aborts it with all work discarded.
    async fn read_once(
        &self,
        asset_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Arc<Entry>>, FetchError> {
        let now = (self.clock)();
        let midnight = utc_midnight(now);
        let mut guard = SkewGuard::new();

        if start < midnight {
            self.read_past(asset_id, start, end, midnight, &mut guard).await
        } else {
            self.read_today(asset_id, start, end, &mut guard).await
        }
    }

    /// `start` falls before our midnight: use a past window, then top up
    /// from "today" if the window stopped short of `end`.
    async fn read_past(
        &self,
        asset_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        midnight: DateTime<Utc>,
        guard: &mut SkewGuard,
    ) -> Result<Vec<Arc<Entry>>, FetchError> {
        let range = select_time_range(midnight - start);
        let first = self
            .fetcher
            .fetch(asset_id, range, start, end, guard, true)
            .await?;

        let past = if first.outcome.covers_left() {
            first
        } else {
            let wider = range.widen();
            info!(
                asset_id,
                from = %range,
                to = %wider,
                reach_hours = wider.span().map(|reach| reach.num_hours()),
                "window does not reach start; widening"
            );
            self.fetcher
                .fetch(asset_id, wider, start, end, guard, false)
                .await?
        };

        let WindowBatch { mut entries, outcome } = past;
        if !outcome.covers_right() {
            // Past windows stop at upstream midnight.
            let today = self
                .fetcher
                .fetch(asset_id, TimeRange::Today, start, end, guard, false)
                .await?;
            entries.extend(today.entries);
        }
        Ok(entries)
    }

    /// `start` is on/after our midnight: "today" should do, unless upstream
    /// is still on the previous day.
    async fn read_today(
        &self,
        asset_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        guard: &mut SkewGuard,
    ) -> Result<Vec<Arc<Entry>>, FetchError> {
        let today = self
            .fetcher
            .fetch(asset_id, TimeRange::Today, start, end, guard, true)
            .await?;
        match today.outcome {
            FetchOutcome::Complete | FetchOutcome::NeedsSupplement => return Ok(today.entries),
            FetchOutcome::NeedsWider { .. } => {}
        }

        let fallback = TimeRange::Today.widen();
        info!(asset_id, to = %fallback, "today does not reach start; reading previous day");
        let WindowBatch { mut entries, outcome } = self
            .fetcher
            .fetch(asset_id, fallback, start, end, guard, false)
            .await?;

        if !outcome.covers_right() {
            // The upstream day boundary may have moved between calls.
            let again = self
                .fetcher
                .fetch(asset_id, TimeRange::Today, start, end, guard, false)
                .await?;
            entries.extend(again.entries);
        }
        Ok(entries)
    }
}

/// Start of the UTC calendar day containing `now`. Total for every instant.
fn utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[async_trait]
impl MetricReader for ChReader {
    async fn read(
        &self,
        asset_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ReaderResult<Vec<Arc<Entry>>> {
        if start >= end {
            debug!(asset_id, %start, %end, "empty interval");
            return Ok(Vec::new());
        }

        let mut rollovers = 0;
        loop {
            match self.read_once(asset_id, start, end).await {
                Ok(entries) => return Ok(entries),
                Err(FetchError::Reader(err)) => return Err(err),
                Err(FetchError::DayRolledOver) => {
                    rollovers += 1;
                    if rollovers > self.max_day_rollovers {
                        return Err(ReaderError::DayRolloverLimit {
                            attempts: rollovers,
                        });
                    }
                    warn!(asset_id, rollovers, "upstream day changed mid-read; starting over");
                }
            }
        }
    }
}
