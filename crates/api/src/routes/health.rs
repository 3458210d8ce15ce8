use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Whether a Replicate API key is configured.
    pub configured: bool,
    /// Model used when a request does not name one.
    pub default_model: String,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
}

/// GET /health -- returns service status and whether Replicate is configured.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider = state.provider.read().await;

    Json(HealthResponse {
        status: "ok",
        configured: provider.is_configured(),
        default_model: provider.default_model.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
