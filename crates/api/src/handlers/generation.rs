//! Handler for `POST /generate`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use rbridge_core::error::CoreError;
use rbridge_core::generation::GenerationRequest;
use rbridge_replicate::GenerationResult;

use crate::error::AppResult;
use crate::state::AppState;

/// POST /generate
///
/// Validates the prompt and resolves the model before checking the key,
/// so a blank prompt is always a 400 regardless of configuration. No
/// remote call is made unless both checks pass.
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> AppResult<Json<GenerationResult>> {
    let Json(request) = payload?;

    let provider = state.provider.read().await;
    let prepared = request.prepare(&provider.default_model)?;
    if !provider.is_configured() {
        return Err(CoreError::api_key_not_configured().into());
    }

    tracing::info!(model = %prepared.model, prompt = %prepared.prompt, "Generating image");

    let result = state.generation.generate(&prepared).await?;
    Ok(Json(result))
}
