#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderValue, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use rbridge_api::config::{ServerConfig, DEFAULT_MOUNT_PATH};
use rbridge_api::router::build_app_router;
use rbridge_api::state::AppState;
use rbridge_core::provider_config::{ProviderConfig, ProviderConfigStore};
use rbridge_replicate::{
    GenerationService, PollConfig, Prediction, PredictionBackend, ReplicateApi,
    ReplicateApiError, Sleeper,
};
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const DEFAULT_MODEL: &str = "black-forest-labs/flux-schnell";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(api_key: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![HeaderValue::from_static("http://localhost:8000")],
        request_timeout_secs: 30,
        mount_path: DEFAULT_MOUNT_PATH.to_string(),
        replicate_api_url: "http://replicate.invalid".to_string(),
        replicate_timeout_secs: 5,
        provider: ProviderConfig::new(api_key, DEFAULT_MODEL),
        poll: PollConfig::default(),
    }
}

/// Prefix `path` with the default mount point.
pub fn url(path: &str) -> String {
    format!("{DEFAULT_MOUNT_PATH}{path}")
}

// ---------------------------------------------------------------------------
// Fake Replicate backend
// ---------------------------------------------------------------------------

/// In-memory backend replaying a scripted sequence of prediction states.
/// The final entry repeats once the script is exhausted.
pub struct FakeBackend {
    script: Mutex<VecDeque<Value>>,
    create_error: Mutex<Option<(u16, String)>>,
    fetch_error: Mutex<Option<(usize, u16, String)>>,
    pub creates: AtomicUsize,
    pub fetches: AtomicUsize,
    pub cancels: AtomicUsize,
    pub last_input: Mutex<Option<(String, Map<String, Value>)>>,
}

impl FakeBackend {
    pub fn new(script: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            create_error: Mutex::new(None),
            fetch_error: Mutex::new(None),
            creates: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
            last_input: Mutex::new(None),
        })
    }

    /// Make every create call fail with the given HTTP status and body.
    pub fn fail_creates_with(&self, status: u16, body: &str) {
        *self.create_error.lock().unwrap() = Some((status, body.to_string()));
    }

    /// Make fetch number `attempt` (1-based) and every later one fail with
    /// the given HTTP status and body.
    pub fn fail_fetches_from(&self, attempt: usize, status: u16, body: &str) {
        *self.fetch_error.lock().unwrap() = Some((attempt, status, body.to_string()));
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionBackend for FakeBackend {
    async fn create_prediction(
        &self,
        model: &str,
        input: &Map<String, Value>,
    ) -> Result<Prediction, ReplicateApiError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some((model.to_string(), input.clone()));
        if let Some((status, body)) = self.create_error.lock().unwrap().clone() {
            return Err(ReplicateApiError::ApiError { status, body });
        }
        Ok(Prediction::from_value(json!({ "id": "pred-123", "status": "starting" }))?)
    }

    async fn get_prediction(&self, _id: &str) -> Result<Prediction, ReplicateApiError> {
        let attempt = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((from, status, body)) = self.fetch_error.lock().unwrap().clone() {
            if attempt >= from {
                return Err(ReplicateApiError::ApiError { status, body });
            }
        }
        let next = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        };
        Ok(Prediction::from_value(next)?)
    }

    async fn cancel_prediction(&self, id: &str) -> Result<Prediction, ReplicateApiError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(Prediction::from_value(json!({ "id": id, "status": "canceled" }))?)
    }
}

/// Sleeper that returns immediately.
pub struct InstantSleeper;

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// A prediction in `status` with no output.
pub fn prediction(status: &str) -> Value {
    json!({ "id": "pred-123", "status": status })
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub backend: Arc<FakeBackend>,
}

/// Build the full application router backed by `backend`, with the given
/// API key pre-configured (empty for "unconfigured").
pub fn build_test_app(api_key: &str, backend: Arc<FakeBackend>) -> TestApp {
    let config = test_config(api_key);
    let provider = Arc::new(ProviderConfigStore::new(config.provider.clone()));
    let state = app_state(
        &config,
        Arc::clone(&provider),
        Arc::clone(&backend) as Arc<dyn PredictionBackend>,
    );

    TestApp {
        router: build_app_router(state.clone(), &config),
        state,
        backend,
    }
}

/// Build the full application router backed by a real [`ReplicateApi`]
/// pointed at `config.replicate_api_url`.
pub fn build_replicate_app(config: &ServerConfig) -> Router {
    let provider = Arc::new(ProviderConfigStore::new(config.provider.clone()));
    let api = ReplicateApi::new(
        config.replicate_api_url.clone(),
        Arc::clone(&provider),
        config.replicate_timeout(),
    );
    let state = app_state(config, provider, Arc::new(api));
    build_app_router(state, config)
}

fn app_state(
    config: &ServerConfig,
    provider: Arc<ProviderConfigStore>,
    backend: Arc<dyn PredictionBackend>,
) -> AppState {
    let generation = GenerationService::new(backend, config.poll.clone(), CancellationToken::new())
        .with_sleeper(Arc::new(InstantSleeper));

    AppState {
        provider,
        generation: Arc::new(generation),
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
