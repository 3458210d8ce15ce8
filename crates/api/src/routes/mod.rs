pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the route tree mounted under the configured mount path.
///
/// ```text
/// /health                     service status (GET)
/// /config                     read, update provider config (GET, POST)
/// /models                     static model catalog (GET)
/// /generate                   create, poll, and normalize a prediction (POST)
/// /prediction/{id}            raw prediction pass-through (GET)
/// /prediction/{id}/cancel     cancel a prediction (POST)
/// ```
pub fn replicate_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .route(
            "/config",
            get(handlers::config::get_config).post(handlers::config::update_config),
        )
        .route("/models", get(handlers::models::list_models))
        .route("/generate", post(handlers::generation::generate))
        .route("/prediction/{id}", get(handlers::predictions::get_prediction))
        .route(
            "/prediction/{id}/cancel",
            post(handlers::predictions::cancel_prediction),
        )
}
