use std::sync::Arc;

use rbridge_core::error::CoreError;
use rbridge_core::provider_config::{ProviderConfig, ProviderConfigStore};
use rbridge_replicate::GenerationService;

use crate::error::AppResult;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Live Replicate credential and default model.
    pub provider: Arc<ProviderConfigStore>,
    /// Prediction lifecycle manager.
    pub generation: Arc<GenerationService>,
}

impl AppState {
    /// Snapshot the provider configuration, failing with `Unauthorized`
    /// when no API key is set.
    pub async fn configured_provider(&self) -> AppResult<Arc<ProviderConfig>> {
        let provider = self.provider.read().await;
        if !provider.is_configured() {
            return Err(CoreError::api_key_not_configured().into());
        }
        Ok(provider)
    }
}
