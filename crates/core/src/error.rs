/// Domain-level errors raised before any remote call is made.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

/// Message returned whenever an operation needs a credential and none is set.
pub const API_KEY_NOT_CONFIGURED: &str = "API key not configured";

impl CoreError {
    /// The error raised when the Replicate API key has not been configured.
    pub fn api_key_not_configured() -> Self {
        CoreError::Unauthorized(API_KEY_NOT_CONFIGURED.to_string())
    }
}
