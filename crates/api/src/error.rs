use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rbridge_core::error::{CoreError, API_KEY_NOT_CONFIGURED};
use rbridge_replicate::{PredictionError, ReplicateApiError};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for request-level failures and [`PredictionError`]
/// for everything that goes wrong talking to Replicate. Implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `rbridge_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A prediction lifecycle error from `rbridge_replicate`.
    #[error(transparent)]
    Prediction(#[from] PredictionError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
            },

            // --- Replicate errors ---
            AppError::Prediction(err) => classify_prediction_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a prediction error into an HTTP status, error code, and message.
///
/// - A missing key (cleared after the handler's own check) maps to 401.
/// - Shutdown aborts map to 503.
/// - Every other remote failure maps to 500 with Replicate's detail intact.
fn classify_prediction_error(err: &PredictionError) -> (StatusCode, &'static str, String) {
    match err {
        PredictionError::Api(ReplicateApiError::MissingApiKey) => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            API_KEY_NOT_CONFIGURED.to_string(),
        ),
        PredictionError::Api(api) => {
            tracing::error!(error = %api, "Replicate API error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "REMOTE_SERVICE_ERROR",
                api.to_string(),
            )
        }
        PredictionError::Failed { prediction_id, reason } => {
            tracing::error!(
                prediction_id = %prediction_id,
                reason = %reason,
                "Prediction failed",
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PREDICTION_FAILED",
                reason.clone(),
            )
        }
        PredictionError::TimedOut { .. } => {
            tracing::error!(error = %err, "Prediction timed out");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PREDICTION_TIMEOUT",
                err.to_string(),
            )
        }
        PredictionError::Aborted { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "PREDICTION_ABORTED",
            err.to_string(),
        ),
    }
}
