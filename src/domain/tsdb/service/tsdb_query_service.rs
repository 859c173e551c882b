use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, Instrument};
use uuid::Uuid;

use super::tsdb_adapter_service::{fetch_time_series, Asset};
use crate::domain::reader::{Clock, MetricReader};
use crate::domain::tsdb::dto::tsdb_query_request::{TsdbQueryRequest, TsdbSubQuery};
use crate::domain::tsdb::dto::tsdb_time_series::TsdbTimeSeries;
use crate::errors::AppError;

const REGION_TAG: &str = "region";
const ACCOUNT_NUMBER_TAG: &str = "accountNumber";
const INSTANCE_ID_TAG: &str = "instanceId";

/// Timestamps below this are taken as seconds rather than milliseconds.
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

pub struct TsdbQueryService {
    reader: Arc<dyn MetricReader>,
    clock: Clock,
}

impl TsdbQueryService {
    pub fn new(reader: Arc<dyn MetricReader>, clock: Clock) -> Self {
        Self { reader, clock }
    }

    pub async fn query(&self, req: TsdbQueryRequest) -> Result<Vec<TsdbTimeSeries>, AppError> {
        let query_id = Uuid::new_v4();
        let started = Instant::now();

        let result = self
            .run(req)
            .instrument(tracing::info_span!("tsdb_query", %query_id))
            .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(series) => info!(%query_id, elapsed_ms, series = series.len(), "query finished"),
            Err(e) => error!(%query_id, elapsed_ms, "query failed: {}", e),
        }
        result
    }

    async fn run(&self, req: TsdbQueryRequest) -> Result<Vec<TsdbTimeSeries>, AppError> {
        let start_ms = normalize_millis(req.start);
        let end_ms = match req.end {
            Some(end) if end > 0 => normalize_millis(end),
            _ => (self.clock)().timestamp_millis(),
        };

        let mut series = Vec::with_capacity(req.queries.len());
        for sub in &req.queries {
            let asset = extract_asset(sub)?;
            let metric = unescape_metric(&sub.metric);
            let points =
                fetch_time_series(self.reader.as_ref(), &asset, &metric, start_ms, end_ms).await?;

            series.push(TsdbTimeSeries {
                metric,
                tags: series_tags(&asset),
                aggregate_tags: Vec::new(),
                dps: points.into_iter().map(|p| (p.ts, p.value)).collect(),
            });
        }
        Ok(series)
    }
}

/// Seconds and milliseconds are both accepted on the wire.
pub fn normalize_millis(ts: i64) -> i64 {
    if ts < MILLIS_THRESHOLD {
        ts.saturating_mul(1000)
    } else {
        ts
    }
}

/// Pulls the asset out of filters first, then tags, so tags win.
pub fn extract_asset(sub: &TsdbSubQuery) -> Result<Asset, AppError> {
    let mut asset = Asset::default();
    let pairs = sub
        .filters
        .iter()
        .map(|f| (f.tagk.as_str(), f.filter.as_str()))
        .chain(sub.tags.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    for (key, value) in pairs {
        match key {
            REGION_TAG => asset.region = value.to_string(),
            ACCOUNT_NUMBER_TAG => asset.account_number = value.to_string(),
            INSTANCE_ID_TAG => asset.instance_id = value.to_string(),
            _ => {}
        }
    }

    if !asset.is_complete() {
        return Err(AppError::BadRequest(
            "region, accountNumber, and instanceId tags required".to_string(),
        ));
    }
    Ok(asset)
}

fn unescape_metric(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn series_tags(asset: &Asset) -> BTreeMap<String, String> {
    BTreeMap::from([
        (REGION_TAG.to_string(), asset.region.clone()),
        (ACCOUNT_NUMBER_TAG.to_string(), asset.account_number.clone()),
        (INSTANCE_ID_TAG.to_string(), asset.instance_id.clone()),
    ])
}
