//! Handlers for `/config`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use rbridge_core::generation::lenient_string;
use rbridge_core::provider_config::ConfigUpdate;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::state::AppState;

/// Public view of the provider configuration. Never includes the key.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub configured: bool,
    pub default_model: String,
}

/// Body of `POST /config`. Non-string values are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfigRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub api_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub default_model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateConfigResponse {
    pub success: bool,
    pub message: &'static str,
}

/// GET /config
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let provider = state.provider.read().await;
    Json(ConfigResponse {
        configured: provider.is_configured(),
        default_model: provider.default_model.clone(),
    })
}

/// POST /config
///
/// Applies only the supplied fields. The key is not checked against
/// Replicate here; a bad key surfaces on the next remote call.
pub async fn update_config(
    State(state): State<AppState>,
    payload: Result<Json<UpdateConfigRequest>, JsonRejection>,
) -> AppResult<Json<UpdateConfigResponse>> {
    let Json(input) = payload?;

    let update = ConfigUpdate {
        api_key: input.api_key,
        default_model: input.default_model,
    };
    state.provider.update(&update).await;

    let provider = state.provider.read().await;
    tracing::info!(
        configured = provider.is_configured(),
        default_model = %provider.default_model,
        "Provider configuration updated",
    );

    Ok(Json(UpdateConfigResponse {
        success: true,
        message: "Configuration updated",
    }))
}
