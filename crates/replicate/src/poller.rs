//! Bounded polling of a Replicate prediction until it reaches a terminal
//! state.
//!
//! Uses a fixed interval rather than exponential backoff: predictions
//! normally finish within a couple of minutes and a constant cadence keeps
//! the attempt budget easy to reason about. The wait goes through the
//! [`Sleeper`] seam so tests can run hundreds of attempts instantly.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::api::{PredictionBackend, ReplicateApiError};
use crate::prediction::{Prediction, PredictionStatus};

/// Default delay between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Default number of fetches before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Failure message used when Replicate reports a cancellation.
pub const CANCELED_MESSAGE: &str = "Prediction was canceled";

/// Tunable parameters for the polling loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between consecutive fetches of a non-terminal prediction.
    pub interval: Duration,
    /// Maximum number of fetches.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Everything that can go wrong between submitting a prediction and
/// receiving its output.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    /// A Replicate API call failed.
    #[error(transparent)]
    Api(#[from] ReplicateApiError),

    /// Replicate reported the prediction as failed or canceled.
    #[error("{reason}")]
    Failed {
        prediction_id: String,
        reason: String,
    },

    /// The attempt budget ran out before a terminal status was seen.
    #[error("Prediction {prediction_id} timed out after {attempts} polling attempts")]
    TimedOut { prediction_id: String, attempts: u32 },

    /// Polling was stopped through the cancellation token.
    #[error("Prediction {prediction_id} was aborted before completion")]
    Aborted { prediction_id: String },
}

/// Suspension used between poll attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Poll `prediction_id` until it succeeds, fails, runs out of attempts, or
/// `cancel` fires.
///
/// Returns the succeeded prediction immediately, without a trailing sleep.
/// `failed` and `canceled` are not retried. Fetch errors propagate as-is.
pub async fn poll_prediction(
    backend: &dyn PredictionBackend,
    prediction_id: &str,
    config: &PollConfig,
    sleeper: &dyn Sleeper,
    cancel: &CancellationToken,
) -> Result<Prediction, PredictionError> {
    let aborted = || PredictionError::Aborted {
        prediction_id: prediction_id.to_string(),
    };

    for attempt in 1..=config.max_attempts {
        let prediction = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(aborted()),
            result = backend.get_prediction(prediction_id) => result?,
        };

        match prediction.status {
            PredictionStatus::Succeeded => {
                tracing::debug!(prediction_id, attempt, "Prediction succeeded");
                return Ok(prediction);
            }
            PredictionStatus::Failed => {
                let detail = prediction
                    .error_message()
                    .unwrap_or_else(|| "unknown error".to_string());
                return Err(PredictionError::Failed {
                    prediction_id: prediction_id.to_string(),
                    reason: format!("Prediction failed: {detail}"),
                });
            }
            PredictionStatus::Canceled => {
                return Err(PredictionError::Failed {
                    prediction_id: prediction_id.to_string(),
                    reason: CANCELED_MESSAGE.to_string(),
                });
            }
            ref status => {
                tracing::debug!(
                    prediction_id,
                    attempt,
                    status = status.as_str(),
                    "Prediction still running",
                );
            }
        }

        if attempt == config.max_attempts {
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(aborted()),
            _ = sleeper.sleep(config.interval) => {}
        }
    }

    tracing::warn!(
        prediction_id,
        attempts = config.max_attempts,
        "Prediction polling budget exhausted",
    );

    Err(PredictionError::TimedOut {
        prediction_id: prediction_id.to_string(),
        attempts: config.max_attempts,
    })
}
