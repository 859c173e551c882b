//! OpenTSDB routes (e.g., /api/query)

use axum::{routing::{get, post}, Router};
use crate::api::controller::tsdb::TsdbController;
use crate::app_state::AppState;

pub fn tsdb_routes() -> Router<AppState> {
    Router::new()
        .route("/query", post(TsdbController::query))
        .route("/suggest", get(TsdbController::suggest))
        .route("/aggregators", get(TsdbController::aggregators))
        .route("/version", get(TsdbController::version))
        .route("/config", get(TsdbController::config))
        .route("/config/filters", get(TsdbController::config_filters))
        .route("/dropcaches", get(TsdbController::dropcaches))

        .fallback(TsdbController::not_found)
}
