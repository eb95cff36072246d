//! Liveness and readiness probes.
//!
//! - `GET /health`: the process is up, never touches the database
//! - `GET /health/ready`: a pooled connection answers `SELECT 1`

use crate::error::ApiError;
use crate::AppState;
use axum::{extract::Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// Handler for `GET /health`.
pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.settings.app.environment,
    }))
}

/// Handler for `GET /health/ready`.
///
/// Returns `503` while the database cannot be reached.
pub async fn readiness_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || openlaunch_db::ping(&pool))
        .await?
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;

    Ok(Json(json!({
        "status": "ok",
        "database": "ok",
    })))
}
