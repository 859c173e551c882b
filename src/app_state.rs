use std::sync::Arc;

use anyhow::Result;

use crate::config::AppConfig;
use crate::core::client::cloudhealth::CloudHealthClient;
use crate::domain::reader::{system_clock, ChReader, Clock, MemoizedReader, MetricReader};
use crate::domain::tsdb::service::tsdb_query_service::TsdbQueryService;

#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<dyn MetricReader>,
    pub tsdb_service: Arc<TsdbQueryService>,
}

impl AppState {
    pub fn with_reader(reader: Arc<dyn MetricReader>, clock: Clock) -> Self {
        Self {
            tsdb_service: Arc::new(TsdbQueryService::new(reader.clone(), clock)),
            reader,
        }
    }
}

/// One memoizing reader shared by every request for the life of the process.
pub fn build_app_state(config: &AppConfig) -> Result<AppState> {
    let pages = Arc::new(CloudHealthClient::new(config.http_timeout)?);
    let reader = ChReader::new(&config.reader_config(), pages);
    let reader: Arc<dyn MetricReader> = Arc::new(MemoizedReader::new(reader));
    Ok(AppState::with_reader(reader, system_clock()))
}
