//! REST API client for Replicate predictions.
//!
//! Wraps the prediction endpoints (create, get, cancel) using [`reqwest`].
//! The API token is read from the shared [`ProviderConfigStore`] on every
//! call, so a configuration update takes effect on the next request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rbridge_core::provider_config::ProviderConfigStore;
use serde_json::{Map, Value};

use crate::prediction::Prediction;

/// Public Replicate API base URL.
pub const DEFAULT_API_URL: &str = "https://api.replicate.com/v1";

/// Upper bound on a single Replicate call, connect through body.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the Replicate REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ReplicateApiError {
    /// No API token is configured; no request was sent.
    #[error("Replicate API key not configured")]
    MissingApiKey,

    /// The configured base URL cannot be turned into an endpoint.
    #[error("Invalid Replicate API URL: {0}")]
    InvalidUrl(String),

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Replicate returned a non-2xx status code.
    #[error("Replicate API error: {status} - {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response whose body is not a prediction.
    #[error("Unexpected Replicate response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The prediction primitives the lifecycle manager depends on.
///
/// [`ReplicateApi`] is the production implementation; tests substitute
/// scripted backends.
#[async_trait]
pub trait PredictionBackend: Send + Sync {
    /// Submit a new prediction. Returns as soon as Replicate has queued it.
    async fn create_prediction(
        &self,
        model: &str,
        input: &Map<String, Value>,
    ) -> Result<Prediction, ReplicateApiError>;

    /// Fetch the current state of a prediction.
    async fn get_prediction(&self, prediction_id: &str) -> Result<Prediction, ReplicateApiError>;

    /// Ask Replicate to stop a prediction.
    async fn cancel_prediction(&self, prediction_id: &str)
        -> Result<Prediction, ReplicateApiError>;
}

/// HTTP client for the Replicate predictions API.
pub struct ReplicateApi {
    client: reqwest::Client,
    api_url: String,
    config: Arc<ProviderConfigStore>,
}

impl ReplicateApi {
    /// Create a client against `api_url`, e.g. [`DEFAULT_API_URL`]. Each
    /// call fails with [`ReplicateApiError::Request`] once `timeout` elapses.
    pub fn new(
        api_url: impl Into<String>,
        config: Arc<ProviderConfigStore>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self::with_client(client, api_url, config)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        config: Arc<ProviderConfigStore>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            config,
        }
    }

    // ---- private helpers ----

    /// Current API token, or [`ReplicateApiError::MissingApiKey`].
    async fn api_key(&self) -> Result<String, ReplicateApiError> {
        let snapshot = self.config.read().await;
        if !snapshot.is_configured() {
            return Err(ReplicateApiError::MissingApiKey);
        }
        Ok(snapshot.api_key.clone())
    }

    /// Build `{api_url}/{segments...}`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, ReplicateApiError> {
        let mut url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| ReplicateApiError::InvalidUrl(format!("{}: {e}", self.api_url)))?;
        url.path_segments_mut()
            .map_err(|()| ReplicateApiError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ReplicateApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ReplicateApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ReplicateApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into a [`Prediction`].
    async fn parse_prediction(
        response: reqwest::Response,
    ) -> Result<Prediction, ReplicateApiError> {
        let response = Self::ensure_success(response).await?;
        let body = response.json::<Value>().await?;
        Ok(Prediction::from_value(body)?)
    }
}

#[async_trait]
impl PredictionBackend for ReplicateApi {
    /// Sends `POST /predictions` with `{"version": model, "input": input}`.
    async fn create_prediction(
        &self,
        model: &str,
        input: &Map<String, Value>,
    ) -> Result<Prediction, ReplicateApiError> {
        let api_key = self.api_key().await?;
        let body = serde_json::json!({
            "version": model,
            "input": input,
        });

        tracing::debug!(model, "Creating Replicate prediction");

        let response = self
            .client
            .post(self.endpoint(&["predictions"])?)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        Self::parse_prediction(response).await
    }

    /// Sends `GET /predictions/{id}`.
    async fn get_prediction(&self, prediction_id: &str) -> Result<Prediction, ReplicateApiError> {
        let api_key = self.api_key().await?;

        let response = self
            .client
            .get(self.endpoint(&["predictions", prediction_id])?)
            .bearer_auth(api_key)
            .send()
            .await?;

        Self::parse_prediction(response).await
    }

    /// Sends `POST /predictions/{id}/cancel`.
    async fn cancel_prediction(
        &self,
        prediction_id: &str,
    ) -> Result<Prediction, ReplicateApiError> {
        let api_key = self.api_key().await?;

        tracing::debug!(prediction_id, "Cancelling Replicate prediction");

        let response = self
            .client
            .post(self.endpoint(&["predictions", prediction_id, "cancel"])?)
            .bearer_auth(api_key)
            .send()
            .await?;

        Self::parse_prediction(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rbridge_core::provider_config::ProviderConfig;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::prediction::{PredictionOutput, PredictionStatus};

    fn api_for(server: &MockServer, key: &str) -> ReplicateApi {
        let config = Arc::new(ProviderConfigStore::new(ProviderConfig::new(
            key,
            "black-forest-labs/flux-schnell",
        )));
        ReplicateApi::new(server.uri(), config, DEFAULT_HTTP_TIMEOUT)
    }

    #[tokio::test]
    async fn create_prediction_posts_version_and_input() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/predictions"))
            .and(header("authorization", "Bearer r8_test"))
            .and(body_json(json!({
                "version": "stability-ai/sdxl",
                "input": { "prompt": "a cat", "width": 1024 }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "pred-1",
                "status": "starting",
                "output": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut input = Map::new();
        input.insert("prompt".into(), json!("a cat"));
        input.insert("width".into(), json!(1024));

        let prediction = api_for(&server, "r8_test")
            .create_prediction("stability-ai/sdxl", &input)
            .await
            .unwrap();

        assert_eq!(prediction.id, "pred-1");
        assert_eq!(prediction.status, PredictionStatus::Starting);
    }

    #[tokio::test]
    async fn get_prediction_keeps_raw_body() {
        let server = MockServer::start().await;
        let body = json!({
            "id": "pred-2",
            "status": "succeeded",
            "output": ["http://x/1.png"],
            "logs": "done"
        });

        Mock::given(method("GET"))
            .and(path("/predictions/pred-2"))
            .and(header("authorization", "Bearer r8_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;

        let prediction = api_for(&server, "r8_test")
            .get_prediction("pred-2")
            .await
            .unwrap();

        assert_eq!(
            prediction.output,
            PredictionOutput::Many(vec!["http://x/1.png".into()])
        );
        assert_eq!(prediction.raw, body);
    }

    #[tokio::test]
    async fn cancel_prediction_posts_to_cancel_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/predictions/pred-3/cancel"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pred-3",
                "status": "canceled"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let prediction = api_for(&server, "r8_test")
            .cancel_prediction("pred-3")
            .await
            .unwrap();

        assert_eq!(prediction.status, PredictionStatus::Canceled);
    }

    #[tokio::test]
    async fn non_success_status_carries_status_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/predictions"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid version"))
            .mount(&server)
            .await;

        let mut input = Map::new();
        input.insert("prompt".into(), json!("a cat"));

        let err = api_for(&server, "r8_test")
            .create_prediction("nope/nope", &input)
            .await
            .unwrap_err();

        assert_matches!(
            err,
            ReplicateApiError::ApiError { status: 422, ref body } if body == "invalid version"
        );
        assert_eq!(err.to_string(), "Replicate API error: 422 - invalid version");
    }

    #[tokio::test]
    async fn missing_key_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = api_for(&server, "").get_prediction("pred-4").await.unwrap_err();
        assert_matches!(err, ReplicateApiError::MissingApiKey);
    }

    #[tokio::test]
    async fn prediction_id_is_percent_encoded() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/predictions/a%2Fb"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let err = api_for(&server, "r8_test").get_prediction("a/b").await.unwrap_err();
        assert_matches!(err, ReplicateApiError::ApiError { status: 404, .. });
    }

    #[tokio::test]
    async fn stalled_response_fails_after_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/predictions/pred-5"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": "pred-5", "status": "processing" }))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let config = Arc::new(ProviderConfigStore::new(ProviderConfig::new(
            "r8_test",
            "black-forest-labs/flux-schnell",
        )));
        let api = ReplicateApi::new(server.uri(), config, Duration::from_millis(200));

        let err = api.get_prediction("pred-5").await.unwrap_err();
        assert_matches!(err, ReplicateApiError::Request(ref e) if e.is_timeout());
    }

    #[test]
    fn endpoint_appends_to_versioned_base() {
        let config = Arc::new(ProviderConfigStore::default());
        let api = ReplicateApi::new(DEFAULT_API_URL, config, DEFAULT_HTTP_TIMEOUT);
        let url = api.endpoint(&["predictions", "xyz"]).unwrap();
        assert_eq!(url.as_str(), "https://api.replicate.com/v1/predictions/xyz");
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let config = Arc::new(ProviderConfigStore::default());
        let api = ReplicateApi::new("not a url", config, DEFAULT_HTTP_TIMEOUT);
        assert_matches!(
            api.endpoint(&["predictions"]),
            Err(ReplicateApiError::InvalidUrl(_))
        );
    }
}
