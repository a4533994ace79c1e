//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::Storage;
use crate::services::WeatherProvider;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Storage and the weather
/// provider are trait objects, so the same router runs against memory or
/// `PostgreSQL` and against the simulated or a real provider.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    storage: Arc<dyn Storage>,
    provider: Arc<dyn WeatherProvider>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        storage: Arc<dyn Storage>,
        provider: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                provider,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the storage backend.
    #[must_use]
    pub fn storage(&self) -> &dyn Storage {
        self.inner.storage.as_ref()
    }

    /// Get the weather provider.
    #[must_use]
    pub fn provider(&self) -> &dyn WeatherProvider {
        self.inner.provider.as_ref()
    }
}
