//! Integration test harness for Nimbus.
//!
//! Each [`TestServer`] is a real server on an ephemeral port with its own
//! in-memory storage, so tests run in parallel without sharing state.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p nimbus-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Registration, login and session handling
//! - `weather` - Location reuse, snapshots and forecasts
//! - `favorites` - Per-user favorites and the client backends

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tower_sessions::MemoryStore;

use nimbus_client::{ApiClient, ClientConfig};
use nimbus_core::Coordinates;
use nimbus_server::config::ServerConfig;
use nimbus_server::db::{MemoryStorage, Storage};
use nimbus_server::routes;
use nimbus_server::services::weather::{CurrentObservation, ForecastFeed};
use nimbus_server::services::{ProviderError, SimulatedProvider, WeatherProvider};
use nimbus_server::state::AppState;

/// A running server plus direct access to its storage.
pub struct TestServer {
    pub addr: SocketAddr,
    pub storage: Arc<MemoryStorage>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server backed by the simulated weather provider.
    pub async fn start() -> Self {
        Self::with_provider(Arc::new(SimulatedProvider::new())).await
    }

    /// Start a server backed by `provider`.
    pub async fn with_provider(provider: Arc<dyn WeatherProvider>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        let storage = Arc::new(MemoryStorage::new());
        let state = AppState::new(
            ServerConfig::default(),
            Arc::clone(&storage) as Arc<dyn Storage>,
            provider,
        );
        let app = routes::app(state, MemoryStore::default());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test server failed");
        });

        Self {
            addr,
            storage,
            handle,
        }
    }

    /// Base URL of the server.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A fresh client with its own cookie jar (i.e. its own session).
    #[must_use]
    pub fn client(&self) -> ApiClient {
        let config = ClientConfig::new(&self.url()).expect("Failed to build client config");
        ApiClient::new(&config).expect("Failed to build API client")
    }

    /// Register a user with a unique email and return a signed-in client.
    pub async fn signed_in_client(&self, username: &str) -> ApiClient {
        let client = self.client();
        let email = unique_email(username);
        client
            .register(username, &email, "correct horse battery")
            .await
            .expect("Failed to register test user");
        client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// An email address no other test will use.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", uuid::Uuid::new_v4().simple())
}

/// Coordinates from literal degrees.
#[must_use]
pub fn coords(lat: f64, lon: f64) -> Coordinates {
    Coordinates::new(lat, lon).expect("Invalid test coordinates")
}

/// A provider whose upstream is always down.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

#[async_trait]
impl WeatherProvider for OfflineProvider {
    async fn current(&self, _: Coordinates) -> Result<CurrentObservation, ProviderError> {
        Err(ProviderError::Unavailable("upstream offline".to_string()))
    }

    async fn forecast(&self, _: Coordinates) -> Result<ForecastFeed, ProviderError> {
        Err(ProviderError::Unavailable("upstream offline".to_string()))
    }
}
