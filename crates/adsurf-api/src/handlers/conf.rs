//! Tuning configuration handlers.

use adsurf_models::TuningConfig;
use axum::extract::State;
use axum::Json;
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

/// Current tuning: operator file, else shipped defaults.
pub async fn get_conf(State(state): State<AppState>) -> ApiResult<Json<TuningConfig>> {
    Ok(Json(state.tuning.load()?))
}

/// Partial update; unknown keys and invalid values are rejected with 400.
///
/// A run already in flight keeps the tuning it started with.
pub async fn update_conf(
    State(state): State<AppState>,
    Json(patch): Json<serde_json::Value>,
) -> ApiResult<Json<TuningConfig>> {
    let updated = state.tuning.update(&patch).await?;
    info!(keys = ?patch.as_object().map(|o| o.keys().cloned().collect::<Vec<_>>()), "Tuning updated");
    Ok(Json(updated))
}
