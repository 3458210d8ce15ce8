use std::net::SocketAddr;
use std::sync::Arc;

use rbridge_core::provider_config::ProviderConfigStore;
use rbridge_replicate::{GenerationService, ReplicateApi};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rbridge_api::config::ServerConfig;
use rbridge_api::router::build_app_router;
use rbridge_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    init_tracing();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        mount_path = %config.mount_path,
        configured = config.provider.is_configured(),
        default_model = %config.provider.default_model,
        "Loaded server configuration",
    );

    // --- Provider configuration store ---
    let provider = Arc::new(ProviderConfigStore::new(config.provider.clone()));

    // --- Replicate client + generation service ---
    let shutdown = CancellationToken::new();
    let api = ReplicateApi::new(
        config.replicate_api_url.clone(),
        Arc::clone(&provider),
        config.replicate_timeout(),
    );
    let generation = Arc::new(GenerationService::new(
        Arc::new(api),
        config.poll.clone(),
        shutdown.clone(),
    ));
    tracing::info!(
        api_url = %config.replicate_api_url,
        replicate_timeout_secs = config.replicate_timeout_secs,
        poll_interval_ms = config.poll.interval.as_millis() as u64,
        poll_max_attempts = config.poll.max_attempts,
        "Generation service ready",
    );

    // --- App state ---
    let state = AppState {
        provider,
        generation,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    // In-flight generations stop polling (and cancel their predictions)
    // as soon as a shutdown signal arrives.
    let abort_generations = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            abort_generations.cancel();
        })
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` controls filtering; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rbridge_api=debug,rbridge_replicate=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
