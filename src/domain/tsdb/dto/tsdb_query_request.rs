use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /api/query` (OpenTSDB subset).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TsdbQueryRequest {
    /// Epoch seconds or milliseconds.
    #[validate(range(min = 0))]
    pub start: i64,

    /// Epoch seconds or milliseconds; defaults to now.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub end: Option<i64>,

    #[validate(length(min = 1), nested)]
    pub queries: Vec<TsdbSubQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TsdbSubQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregator: Option<String>,

    #[validate(length(min = 1))]
    pub metric: String,

    #[serde(default)]
    pub tags: HashMap<String, String>,

    #[serde(default)]
    pub filters: Vec<TsdbFilter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TsdbFilter {
    #[serde(rename = "type", default)]
    pub filter_type: String,
    pub tagk: String,
    pub filter: String,
    #[serde(rename = "groupBy", default)]
    pub group_by: bool,
}
