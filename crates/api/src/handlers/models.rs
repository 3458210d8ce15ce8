use axum::extract::State;
use axum::Json;
use rbridge_core::models::{ModelInfo, MODEL_CATALOG};
use serde::Serialize;

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: &'static [ModelInfo],
}

/// GET /models
///
/// The catalog is static, but it is still gated on a configured key so
/// clients see the same "configure first" behaviour as every other call.
pub async fn list_models(State(state): State<AppState>) -> AppResult<Json<ModelsResponse>> {
    state.configured_provider().await?;
    Ok(Json(ModelsResponse {
        models: MODEL_CATALOG,
    }))
}
