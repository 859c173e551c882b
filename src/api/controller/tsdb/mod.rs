//! OpenTSDB-compatible endpoints backed by the metrics reader.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use validator::Validate;

use crate::app_state::AppState;
use crate::domain::tsdb::dto::tsdb_query_request::TsdbQueryRequest;
use crate::domain::tsdb::dto::tsdb_time_series::TsdbTimeSeries;
use crate::errors::AppError;

pub struct TsdbController;

impl TsdbController {
    pub async fn query(
        State(state): State<AppState>,
        payload: Result<Json<TsdbQueryRequest>, JsonRejection>,
    ) -> Result<Json<Vec<TsdbTimeSeries>>, AppError> {
        let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
        req.validate()?;
        Ok(Json(state.tsdb_service.query(req).await?))
    }

    pub async fn suggest() -> Json<Vec<String>> {
        Json(Vec::new())
    }

    pub async fn aggregators() -> Json<Vec<&'static str>> {
        Json(vec!["avg"])
    }

    pub async fn version() -> Json<Value> {
        Json(json!({ "version": "1.0" }))
    }

    pub async fn config() -> Json<Value> {
        Json(json!({
            "tsd.ore.auto_create_metrics": "true",
            "tsd.ore.auto_create_tagks": "true",
            "tsd.ore.auto_create_tagvs": "true",
        }))
    }

    pub async fn config_filters() -> Json<Value> {
        Json(json!({
            "literal_or": {
                "examples": "instanceId=literal_or(i-12345678)",
                "description": "Accepts one or more exact values and matches if the series contains any of them."
            },
            "not_literal_or": {
                "examples": "instanceId=not_literal_or(i-12345678)",
                "description": "Accepts one or more exact values and matches if the series does NOT contain any of them."
            }
        }))
    }

    /// Acknowledged only; cached reads stay valid for the process lifetime.
    pub async fn dropcaches() -> Json<Value> {
        Json(json!({ "message": "Caches dropped", "status": "200" }))
    }

    pub async fn not_found() -> AppError {
        AppError::NotFound("Endpoint not found".to_string())
    }
}
