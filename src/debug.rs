use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::domain::reader::MetricReader;

/// Runs only when in UHURA_DEBUG_MODE
pub async fn run_debug(config: &AppConfig, reader: Arc<dyn MetricReader>) {
    info!("🔧 Debug mode: running debug tasks...");

    let Some(asset_id) = config.debug_asset.as_deref() else {
        warn!("UHURA_DEBUG_ASSET not set, nothing to read");
        return;
    };

    let end = Utc::now();
    let start = end - Duration::hours(3);
    match reader.read(asset_id, start, end).await {
        Ok(entries) => {
            info!(asset_id, entries = entries.len(), %start, %end, "Read last three hours");
            if let Some(last) = entries.last() {
                info!(time = %last.time, metrics = last.values.len(), "Latest entry");
            }
        }
        Err(e) => error!(asset_id, "Debug read failed: {}", e),
    }

    info!("Debug tasks completed. Exiting...");
}
