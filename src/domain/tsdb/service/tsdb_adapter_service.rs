use chrono::{DateTime, TimeZone, Utc};

use crate::domain::reader::MetricReader;
use crate::errors::AppError;

/// Metric names with this prefix live on the instance's filesystem asset.
const FS_METRIC_PREFIX: &str = "fs:";

/// A specific machine in an AWS fleet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Asset {
    /// e.g. "us-east-1"
    pub region: String,
    /// e.g. "12345678901"
    pub account_number: String,
    /// e.g. "i-12345678"
    pub instance_id: String,
}

impl Asset {
    pub fn is_complete(&self) -> bool {
        !self.region.is_empty() && !self.account_number.is_empty() && !self.instance_id.is_empty()
    }
}

/// One data point of a single metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TsPoint {
    /// Unix seconds.
    pub ts: i64,
    pub value: f64,
}

pub fn compute_asset_id(asset: &Asset, fs_metric: bool) -> String {
    let id = format!(
        "arn:aws:ec2:{}:{}:instance/{}",
        asset.region, asset.account_number, asset.instance_id
    );
    if fs_metric {
        format!("{id}:fs//")
    } else {
        id
    }
}

pub fn millis_to_time(millis: i64) -> Result<DateTime<Utc>, AppError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| AppError::BadRequest(format!("timestamp out of range: {millis}")))
}

/// Reads metric `name` of `asset` between `start_ms` inclusive and `end_ms`
/// exclusive (epoch milliseconds). Entries lacking the metric are skipped.
pub async fn fetch_time_series(
    reader: &dyn MetricReader,
    asset: &Asset,
    name: &str,
    start_ms: i64,
    end_ms: i64,
) -> Result<Vec<TsPoint>, AppError> {
    let asset_id = compute_asset_id(asset, name.starts_with(FS_METRIC_PREFIX));
    let entries = reader
        .read(&asset_id, millis_to_time(start_ms)?, millis_to_time(end_ms)?)
        .await?;

    Ok(entries
        .iter()
        .filter_map(|entry| {
            entry.values.get(name).map(|value| TsPoint {
                ts: entry.time.timestamp(),
                value: *value,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reader::{Entry, ReaderError, ReaderResult};
    use async_trait::async_trait;
    use chrono::{Duration, DurationRound};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const ASSET_ID: &str = "arn:aws:ec2:us-east-1:12345:instance/i-12345678";
    const FS_ASSET_ID: &str = "arn:aws:ec2:us-east-1:12345:instance/i-12345678:fs//";

    /// Hourly entries. Even hours carry "<kind>:even", odd hours
    /// "<kind>:odd", valued at hours since epoch; kind is "cpu" for the
    /// instance asset and "fs" for the filesystem asset.
    #[derive(Default)]
    struct FakeReader {
        fs_use_count: AtomicUsize,
        instance_use_count: AtomicUsize,
    }

    #[async_trait]
    impl MetricReader for FakeReader {
        async fn read(
            &self,
            asset_id: &str,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> ReaderResult<Vec<Arc<Entry>>> {
            let kind = match asset_id {
                ASSET_ID => {
                    self.instance_use_count.fetch_add(1, Ordering::SeqCst);
                    "cpu"
                }
                FS_ASSET_ID => {
                    self.fs_use_count.fetch_add(1, Ordering::SeqCst);
                    "fs"
                }
                other => {
                    return Err(ReaderError::Upstream {
                        status: 404,
                        body: format!("got unrecognised asset Id '{other}'"),
                    })
                }
            };

            let mut ts = start.duration_trunc(Duration::hours(1)).unwrap();
            if ts < start {
                ts += Duration::hours(1);
            }
            let mut result = Vec::new();
            while ts < end {
                let unix = ts.timestamp();
                let parity = if unix % 7200 == 0 { "even" } else { "odd" };
                result.push(Arc::new(
                    Entry::new(ts).with_value(format!("{kind}:{parity}"), unix as f64 / 3600.0),
                ));
                ts += Duration::hours(1);
            }
            Ok(result)
        }
    }

    fn asset() -> Asset {
        Asset {
            region: "us-east-1".into(),
            account_number: "12345".into(),
            instance_id: "i-12345678".into(),
        }
    }

    fn now_ms() -> i64 {
        Utc.with_ymd_and_hms(2017, 6, 20, 16, 0, 0).unwrap().timestamp_millis()
    }

    async fn fetch(reader: &FakeReader, name: &str) -> Vec<TsPoint> {
        fetch_time_series(reader, &asset(), name, now_ms(), now_ms() + 5 * 3600 * 1000)
            .await
            .unwrap()
    }

    fn points(offsets_h: &[i64]) -> Vec<TsPoint> {
        let secs = now_ms() / 1000;
        offsets_h
            .iter()
            .map(|h| TsPoint {
                ts: secs + h * 3600,
                value: secs as f64 / 3600.0 + *h as f64,
            })
            .collect()
    }

    #[test]
    fn asset_ids() {
        assert_eq!(compute_asset_id(&asset(), false), ASSET_ID);
        assert_eq!(compute_asset_id(&asset(), true), FS_ASSET_ID);
    }

    #[test]
    fn millis_keep_sub_second_precision() {
        let t = millis_to_time(1_497_974_400_123).unwrap();
        assert_eq!(t.timestamp(), 1_497_974_400);
        assert_eq!(t.timestamp_subsec_millis(), 123);
    }

    #[tokio::test]
    async fn cpu_metrics_use_instance_asset() {
        let reader = FakeReader::default();
        assert_eq!(fetch(&reader, "cpu:even").await, points(&[0, 2, 4]));
        assert_eq!(fetch(&reader, "cpu:odd").await, points(&[1, 3]));
        assert!(fetch(&reader, "cpu:none").await.is_empty());
        assert_eq!(reader.instance_use_count.load(Ordering::SeqCst), 3);
        assert_eq!(reader.fs_use_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fs_metrics_use_fs_asset() {
        let reader = FakeReader::default();
        assert_eq!(fetch(&reader, "fs:even").await, points(&[0, 2, 4]));
        assert_eq!(fetch(&reader, "fs:odd").await, points(&[1, 3]));
        assert!(fetch(&reader, "fs:none").await.is_empty());
        assert_eq!(reader.fs_use_count.load(Ordering::SeqCst), 3);
        assert_eq!(reader.instance_use_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reader_errors_propagate() {
        let reader = FakeReader::default();
        let other = Asset {
            instance_id: "i-other".into(),
            ..asset()
        };
        let err = fetch_time_series(&reader, &other, "cpu:even", now_ms(), now_ms() + 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamError(_)));
    }
}
