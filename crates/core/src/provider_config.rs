//! Process-wide Replicate provider configuration.
//!
//! [`ProviderConfigStore`] owns the single live [`ProviderConfig`] and
//! hands out immutable snapshots. Updates replace the whole snapshot, so a
//! reader never observes a half-applied update.

use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::DEFAULT_MODEL_ID;

/// Credential and default model used for every Replicate call.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Replicate API token. Empty means "unconfigured".
    pub api_key: String,
    /// Model used when a generation request does not name one.
    pub default_model: String,
}

impl ProviderConfig {
    /// Build a configuration, trimming the key and falling back to
    /// [`DEFAULT_MODEL_ID`] when `default_model` is blank.
    pub fn new(api_key: impl Into<String>, default_model: impl Into<String>) -> Self {
        let default_model = default_model.into();
        let default_model = match default_model.trim() {
            "" => DEFAULT_MODEL_ID.to_string(),
            trimmed => trimmed.to_string(),
        };
        Self {
            api_key: api_key.into().trim().to_string(),
            default_model,
        }
    }

    /// Whether an API key is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new("", DEFAULT_MODEL_ID)
    }
}

// The token must never end up in logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &if self.is_configured() { "<redacted>" } else { "" })
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// A partial configuration change. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    /// New API key. Blank or whitespace-only clears the key.
    pub api_key: Option<String>,
    /// New default model. Blank values are ignored.
    pub default_model: Option<String>,
}

impl ConfigUpdate {
    /// Apply this update to `current`, producing the next snapshot.
    pub fn apply(&self, current: &ProviderConfig) -> ProviderConfig {
        let mut next = current.clone();

        if let Some(key) = &self.api_key {
            next.api_key = key.trim().to_string();
        }

        if let Some(model) = self.default_model.as_deref().map(str::trim) {
            if !model.is_empty() {
                next.default_model = model.to_string();
            }
        }

        next
    }
}

/// Shared, concurrently readable holder of the live [`ProviderConfig`].
///
/// Designed to be wrapped in `Arc` and injected into both the HTTP layer
/// and the Replicate client.
#[derive(Debug, Default)]
pub struct ProviderConfigStore {
    current: RwLock<Arc<ProviderConfig>>,
}

impl ProviderConfigStore {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Return the current snapshot. The lock is released before returning.
    pub async fn read(&self) -> Arc<ProviderConfig> {
        Arc::clone(&*self.current.read().await)
    }

    /// Apply a partial update as a single snapshot replacement.
    pub async fn update(&self, update: &ConfigUpdate) {
        let mut guard = self.current.write().await;
        let next = update.apply(&guard);
        *guard = Arc::new(next);
    }

    /// Whether an API key is currently configured.
    pub async fn is_configured(&self) -> bool {
        self.read().await.is_configured()
    }
}
