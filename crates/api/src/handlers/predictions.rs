//! Handlers for `/prediction/{id}`.
//!
//! Both return Replicate's JSON untouched for clients that track
//! predictions themselves.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /prediction/{id}
pub async fn get_prediction(
    State(state): State<AppState>,
    Path(prediction_id): Path<String>,
) -> AppResult<Json<Value>> {
    state.configured_provider().await?;
    let raw = state.generation.get_prediction(&prediction_id).await?;
    Ok(Json(raw))
}

/// POST /prediction/{id}/cancel
pub async fn cancel_prediction(
    State(state): State<AppState>,
    Path(prediction_id): Path<String>,
) -> AppResult<Json<Value>> {
    state.configured_provider().await?;
    let raw = state.generation.cancel_prediction(&prediction_id).await?;
    Ok(Json(raw))
}
