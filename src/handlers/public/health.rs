// handlers/public/health.rs - GET /health handler

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

/// GET /health - liveness plus a store round trip
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.store.ping().await.map_err(|e| {
        tracing::error!(error = %e, "Health check failed");
        ApiError::service_unavailable("database unavailable")
    })?;

    Ok(Json(json!({ "status": "ok" })))
}
