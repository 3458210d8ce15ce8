//! The create → poll → normalize lifecycle behind `POST /generate`.

use std::sync::Arc;

use rbridge_core::generation::PreparedGeneration;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::api::PredictionBackend;
use crate::normalize::normalize;
use crate::poller::{poll_prediction, PollConfig, PredictionError, Sleeper, TokioSleeper};

/// Outcome of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// Image URLs in the order Replicate returned them. May be empty.
    pub images: Vec<String>,
    pub prompt: String,
    pub model: String,
    pub prediction_id: String,
}

/// Runs predictions end to end against a [`PredictionBackend`].
///
/// Holds no per-request state; concurrent calls are independent. Every
/// poll loop listens on a child of `shutdown`, so cancelling that token
/// aborts in-flight generations and cancels their predictions remotely.
/// A fetch error while polling also cancels the prediction remotely.
pub struct GenerationService {
    backend: Arc<dyn PredictionBackend>,
    poll: PollConfig,
    sleeper: Arc<dyn Sleeper>,
    shutdown: CancellationToken,
}

impl GenerationService {
    pub fn new(
        backend: Arc<dyn PredictionBackend>,
        poll: PollConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            backend,
            poll,
            sleeper: Arc::new(TokioSleeper),
            shutdown,
        }
    }

    /// Replace the sleeper used between poll attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Submit `request`, wait for it to finish, and normalize its output.
    pub async fn generate(
        &self,
        request: &PreparedGeneration,
    ) -> Result<GenerationResult, PredictionError> {
        let created = self
            .backend
            .create_prediction(&request.model, &request.input)
            .await?;

        tracing::info!(
            prediction_id = %created.id,
            model = %request.model,
            "Prediction created",
        );

        let cancel = self.shutdown.child_token();
        let completed = match poll_prediction(
            self.backend.as_ref(),
            &created.id,
            &self.poll,
            self.sleeper.as_ref(),
            &cancel,
        )
        .await
        {
            Ok(prediction) => prediction,
            Err(err @ (PredictionError::Aborted { .. } | PredictionError::Api(_))) => {
                // We stop watching a prediction that may still be running.
                self.cancel_remote(&created.id).await;
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(
                    prediction_id = %created.id,
                    error = %err,
                    "Prediction did not succeed",
                );
                return Err(err);
            }
        };

        let images = normalize(&completed);
        if images.is_empty() {
            tracing::warn!(prediction_id = %completed.id, "Prediction succeeded without output");
        } else {
            tracing::info!(
                prediction_id = %completed.id,
                image_count = images.len(),
                "Prediction completed",
            );
        }

        Ok(GenerationResult {
            images,
            prompt: request.prompt.clone(),
            model: request.model.clone(),
            prediction_id: completed.id,
        })
    }

    /// Fetch a prediction and return Replicate's JSON unchanged.
    pub async fn get_prediction(&self, prediction_id: &str) -> Result<Value, PredictionError> {
        Ok(self.backend.get_prediction(prediction_id).await?.raw)
    }

    /// Cancel a prediction and return Replicate's JSON unchanged.
    pub async fn cancel_prediction(&self, prediction_id: &str) -> Result<Value, PredictionError> {
        let prediction = self.backend.cancel_prediction(prediction_id).await?;
        tracing::info!(prediction_id, "Prediction cancel requested");
        Ok(prediction.raw)
    }

    /// Best-effort remote cancel for a prediction we stopped waiting on.
    async fn cancel_remote(&self, prediction_id: &str) {
        match self.backend.cancel_prediction(prediction_id).await {
            Ok(_) => tracing::info!(prediction_id, "Cancelled abandoned prediction"),
            Err(e) => tracing::warn!(
                prediction_id,
                error = %e,
                "Failed to cancel abandoned prediction",
            ),
        }
    }
}
