//! Wire format of one metrics API page and its decoding into entries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::reader::{Entry, ReaderError, ReaderResult};

const ASSET_ID_KEY: &str = "assetId";
const TIMESTAMP_KEY: &str = "timestamp";

#[derive(Debug, Deserialize)]
pub struct ChResponse {
    #[serde(default)]
    pub datasets: Vec<ChDataset>,
    #[serde(default)]
    pub request: ChRequest,
}

#[derive(Debug, Deserialize)]
pub struct ChDataset {
    pub metadata: Option<ChMetadata>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

/// Column names for each value group. Other metadata fields are ignored.
#[derive(Debug, Deserialize)]
pub struct ChMetadata {
    #[serde(default)]
    pub keys: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChRequest {
    pub next: Option<String>,
}

fn malformed(msg: impl Into<String>) -> ReaderError {
    ReaderError::MalformedResponse(msg.into())
}

/// Decodes a response body into entries and the next-page URL.
pub fn decode_page(body: &[u8]) -> ReaderResult<(Vec<Arc<Entry>>, Option<String>)> {
    let response: ChResponse =
        serde_json::from_slice(body).map_err(|e| malformed(format!("invalid JSON: {e}")))?;
    extract_metrics(response)
}

pub fn extract_metrics(response: ChResponse) -> ReaderResult<(Vec<Arc<Entry>>, Option<String>)> {
    if response.datasets.len() > 1 {
        return Err(malformed("multiple datasets not supported"));
    }

    let mut entries = Vec::new();
    for dataset in response.datasets {
        let metadata = dataset
            .metadata
            .ok_or_else(|| malformed("metadata chunk missing"))?;
        for group in &dataset.values {
            entries.push(Arc::new(extract_entry(&metadata.keys, group)?));
        }
    }

    let next = response.request.next.filter(|next| !next.is_empty());
    Ok((entries, next))
}

fn extract_entry(keys: &[String], group: &[Value]) -> ReaderResult<Entry> {
    if group.len() != keys.len() {
        return Err(malformed(format!(
            "wrong number of values: expected {}, got {}",
            keys.len(),
            group.len()
        )));
    }

    let mut time: Option<DateTime<Utc>> = None;
    let mut values = std::collections::HashMap::new();
    for (key, value) in keys.iter().zip(group) {
        match key.as_str() {
            ASSET_ID_KEY => {}
            TIMESTAMP_KEY => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| malformed(format!("{value} should be a string")))?;
                let parsed = DateTime::parse_from_rfc3339(raw)
                    .map_err(|e| malformed(format!("bad timestamp {raw:?}: {e}")))?;
                time = Some(parsed.with_timezone(&Utc));
            }
            _ if value.is_null() => {}
            _ => {
                let v = value
                    .as_f64()
                    .ok_or_else(|| malformed(format!("{value} should be a float")))?;
                values.insert(key.clone(), v);
            }
        }
    }

    let time = time.ok_or_else(|| malformed("missing timestamp"))?;
    Ok(Entry { time, values })
}
