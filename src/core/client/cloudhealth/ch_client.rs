use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use http::header::DATE;
use reqwest::Client;
use tracing::debug;

use super::ch_response::decode_page;
use crate::domain::reader::{Page, PageFetcher, ReaderError, ReaderResult};

/// HTTP implementation of the single-page fetch against the metrics API.
pub struct CloudHealthClient {
    client: Client,
}

impl CloudHealthClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for CloudHealthClient {
    async fn fetch(&self, url: &str) -> ReaderResult<Page> {
        // URLs carry the api key, so keep them out of error text.
        let transport = |e: reqwest::Error| ReaderError::Transport(e.without_url().to_string());

        let resp = self.client.get(url).send().await.map_err(transport)?;
        let status = resp.status();
        let batch_date = resp
            .headers()
            .get(DATE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_batch_date);

        if status.as_u16() >= 400 {
            let body = resp.text().await.map_err(transport)?;
            return Err(ReaderError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await.map_err(transport)?;
        let (entries, next) = decode_page(&body)?;
        debug!(
            status = status.as_u16(),
            entries = entries.len(),
            has_next = next.is_some(),
            ?batch_date,
            "metrics page decoded"
        );

        Ok(Page {
            entries,
            next,
            batch_date,
        })
    }
}

/// UTC calendar day of an HTTP `Date` header such as
/// `Tue, 20 Jun 2017 12:00:00 GMT`.
pub fn parse_batch_date(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc).date_naive())
}
