use std::collections::BTreeMap;

use serde::Serialize;

/// One series in the `POST /api/query` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TsdbTimeSeries {
    pub metric: String,
    pub tags: BTreeMap<String, String>,
    pub aggregate_tags: Vec<String>,
    /// Unix seconds -> value.
    pub dps: BTreeMap<i64, f64>,
}
