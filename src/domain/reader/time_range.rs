//! The upstream's fixed vocabulary of relative lookback windows.

use chrono::Duration;
use std::fmt;

/// A named `time_range` the metrics API understands. Every past window ends
/// at the upstream's midnight; `Today` runs from that midnight to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeRange {
    Yesterday,
    Last2Days,
    Last7Days,
    Last14Days,
    Last31Days,
    Today,
}

/// Past windows ordered by ascending span, in hours.
const LADDER: [(TimeRange, i64); 5] = [
    (TimeRange::Yesterday, 24),
    (TimeRange::Last2Days, 2 * 24),
    (TimeRange::Last7Days, 7 * 24),
    (TimeRange::Last14Days, 14 * 24),
    (TimeRange::Last31Days, 31 * 24),
];

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Yesterday => "yesterday",
            TimeRange::Last2Days => "last_2_days",
            TimeRange::Last7Days => "last_7_days",
            TimeRange::Last14Days => "last_14_days",
            TimeRange::Last31Days => "last_31_days",
            TimeRange::Today => "today",
        }
    }

    /// How far back from midnight this window reaches. `None` for `Today`.
    pub fn span(&self) -> Option<Duration> {
        LADDER
            .iter()
            .find(|(range, _)| range == self)
            .map(|(_, hours)| Duration::hours(*hours))
    }

    /// The next wider window, or the widest one if already at the top.
    /// `Today` widens to `Yesterday`.
    pub fn widen(self) -> TimeRange {
        match LADDER.iter().position(|(range, _)| *range == self) {
            Some(idx) => LADDER[(idx + 1).min(LADDER.len() - 1)].0,
            None => TimeRange::Yesterday,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Narrowest past window whose span is at least `distance_to_midnight`,
/// falling back to the widest window when nothing is long enough.
pub fn select_time_range(distance_to_midnight: Duration) -> TimeRange {
    let idx = LADDER.partition_point(|(_, hours)| Duration::hours(*hours) < distance_to_midnight);
    LADDER[idx.min(LADDER.len() - 1)].0
}
