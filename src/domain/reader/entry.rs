use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// All the metric values an asset reported at one timestamp.
///
/// Entries are shared behind `Arc` between the memo cache and every caller
/// that reads them, so they are never mutated after decoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub time: DateTime<Utc>,
    /// Metric name -> value. Metrics reported as null upstream are absent.
    pub values: HashMap<String, f64>,
}

#[cfg(test)]
impl Entry {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time,
            values: HashMap::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }
}

/// One page returned by the upstream metrics API.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Samples in upstream order. No ordering is guaranteed.
    pub entries: Vec<Arc<Entry>>,
    /// Absolute URL of the next page, if any.
    pub next: Option<String>,
    /// Calendar day (UTC) the upstream server reported for this response.
    pub batch_date: Option<NaiveDate>,
}

/// Exact-match memo key. Instants are held in UTC so two representations of
/// the same instant in different offsets produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub asset_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CacheKey {
    pub fn new(asset_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            start,
            end,
        }
    }
}
