use std::time::Duration;

use axum::http::HeaderValue;
use rbridge_core::models::DEFAULT_MODEL_ID;
use rbridge_core::provider_config::ProviderConfig;
use rbridge_replicate::api::{DEFAULT_API_URL, DEFAULT_HTTP_TIMEOUT};
use rbridge_replicate::poller::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use rbridge_replicate::PollConfig;

/// Mount point shared with the chat application's plugin loader.
pub const DEFAULT_MOUNT_PATH: &str = "/api/plugins/replicate";

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<HeaderValue>,
    /// HTTP request timeout in seconds (default: `300`). Must exceed the
    /// polling budget plus one Replicate call, see [`ServerConfig::validate`].
    pub request_timeout_secs: u64,
    /// Path prefix for every route (default: [`DEFAULT_MOUNT_PATH`]).
    pub mount_path: String,
    /// Replicate API base URL.
    pub replicate_api_url: String,
    /// Timeout for a single Replicate call in seconds (default: `30`).
    pub replicate_timeout_secs: u64,
    /// Initial provider configuration (token seeded from the environment).
    pub provider: ProviderConfig,
    /// Prediction polling cadence and budget.
    pub poll: PollConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                          |
    /// |---------------------------|----------------------------------|
    /// | `HOST`                    | `0.0.0.0`                        |
    /// | `PORT`                    | `3000`                           |
    /// | `CORS_ORIGINS`            | `http://localhost:8000`          |
    /// | `REQUEST_TIMEOUT_SECS`    | `300`                            |
    /// | `MOUNT_PATH`              | `/api/plugins/replicate`         |
    /// | `REPLICATE_API_BASE`      | `https://api.replicate.com/v1`   |
    /// | `REPLICATE_TIMEOUT_SECS`  | `30`                             |
    /// | `REPLICATE_API_TOKEN`     | *(empty, unconfigured)*          |
    /// | `REPLICATE_DEFAULT_MODEL` | `black-forest-labs/flux-schnell` |
    /// | `POLL_INTERVAL_MS`        | `2000`                           |
    /// | `POLL_MAX_ATTEMPTS`       | `60`                             |
    ///
    /// Panics at startup on unparsable values or when [`Self::validate`]
    /// rejects the combination.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:8000".into())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|o| {
                o.parse()
                    .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
            })
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let mount_path = normalize_mount_path(
            &std::env::var("MOUNT_PATH").unwrap_or_else(|_| DEFAULT_MOUNT_PATH.into()),
        );

        let replicate_api_url = std::env::var("REPLICATE_API_BASE")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let replicate_timeout_secs: u64 = std::env::var("REPLICATE_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_HTTP_TIMEOUT.as_secs().to_string())
            .parse()
            .expect("REPLICATE_TIMEOUT_SECS must be a valid u64");

        let provider = ProviderConfig::new(
            std::env::var("REPLICATE_API_TOKEN").unwrap_or_default(),
            std::env::var("REPLICATE_DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL_ID.into()),
        );

        let poll_interval_ms: u64 = std::env::var("POLL_INTERVAL_MS")
            .unwrap_or_else(|_| DEFAULT_POLL_INTERVAL.as_millis().to_string())
            .parse()
            .expect("POLL_INTERVAL_MS must be a valid u64");

        let poll_max_attempts: u32 = std::env::var("POLL_MAX_ATTEMPTS")
            .unwrap_or_else(|_| DEFAULT_MAX_ATTEMPTS.to_string())
            .parse()
            .expect("POLL_MAX_ATTEMPTS must be a valid u32");

        let config = Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            mount_path,
            replicate_api_url,
            replicate_timeout_secs,
            provider,
            poll: PollConfig {
                interval: Duration::from_millis(poll_interval_ms),
                max_attempts: poll_max_attempts,
            },
        };
        config
            .validate()
            .unwrap_or_else(|e| panic!("Invalid server configuration: {e}"));
        config
    }

    /// Timeout for a single Replicate call.
    pub fn replicate_timeout(&self) -> Duration {
        Duration::from_secs(self.replicate_timeout_secs)
    }

    /// Total time spent sleeping between polls when every attempt is used.
    pub fn poll_budget(&self) -> Duration {
        self.poll.interval * self.poll.max_attempts.saturating_sub(1)
    }

    /// Check that a generation always finishes (or fails with a typed
    /// error) before the HTTP request timeout fires.
    ///
    /// The worst case that must fit is the full poll budget followed by
    /// one stalled Replicate call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.max_attempts == 0 {
            return Err(ConfigError::ZeroPollAttempts);
        }
        if self.replicate_timeout_secs == 0 {
            return Err(ConfigError::ZeroReplicateTimeout);
        }

        let request_timeout = Duration::from_secs(self.request_timeout_secs);
        let worst_case = self.poll_budget() + self.replicate_timeout();
        if worst_case >= request_timeout {
            return Err(ConfigError::PollBudgetExceedsTimeout {
                budget_secs: worst_case.as_secs_f64(),
                request_timeout_secs: self.request_timeout_secs,
            });
        }
        Ok(())
    }
}

/// Rejected configuration combinations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("POLL_MAX_ATTEMPTS must be at least 1")]
    ZeroPollAttempts,

    #[error("REPLICATE_TIMEOUT_SECS must be at least 1")]
    ZeroReplicateTimeout,

    #[error(
        "poll budget plus one Replicate call ({budget_secs}s) must be shorter than \
         REQUEST_TIMEOUT_SECS ({request_timeout_secs}s)"
    )]
    PollBudgetExceedsTimeout {
        budget_secs: f64,
        request_timeout_secs: u64,
    },
}

/// Ensure a leading slash and strip trailing ones. `""` and `"/"` both
/// become `"/"`, meaning "mount at the root".
pub fn normalize_mount_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    format!("/{trimmed}")
}
