//! HTTP client for the `/api` REST surface.
//!
//! The client keeps a cookie store, so a successful `register` or `login`
//! authenticates every later call made through the same [`ApiClient`] (or any
//! of its clones).

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use nimbus_core::api::{
    AddFavoriteRequest, AuthResponse, CityMatch, CurrentWeatherResponse, FavoriteEntry,
    ForecastResponse, LoginRequest, MessageResponse, RegisterRequest, UserSummary,
};
use nimbus_core::{Coordinates, Location, LocationId};

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Weather reads used by the dashboard.
///
/// Split out from [`ApiClient`] so the dashboard session can run against a
/// scripted implementation.
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// `GET /api/weather/current`.
    async fn current_weather(
        &self,
        coords: Coordinates,
    ) -> Result<CurrentWeatherResponse, ClientError>;

    /// `GET /api/weather/forecast`.
    async fn forecast(&self, coords: Coordinates) -> Result<ForecastResponse, ClientError>;
}

/// Nimbus REST client.
///
/// Cheap to clone; clones share the connection pool and the session cookie.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the configured server.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Server root this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // === Auth ===

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 400 for invalid data or a
    /// duplicate account.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserSummary, ClientError> {
        let body = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self
            .send_json(Method::POST, "api/auth/register", Some(&body))
            .await?;
        debug!(user_id = %response.user.id, "Registered");
        Ok(response.user)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 401 for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<UserSummary, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self
            .send_json(Method::POST, "api/auth/login", Some(&body))
            .await?;
        debug!(user_id = %response.user.id, "Logged in");
        Ok(response.user)
    }

    /// End the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ClientError> {
        let _: MessageResponse = self
            .send_json::<(), _>(Method::POST, "api/auth/logout", None)
            .await?;
        Ok(())
    }

    /// The signed-in user, or `None` when there is no session.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than 401.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<Option<UserSummary>, ClientError> {
        match self
            .send_json::<(), AuthResponse>(Method::GET, "api/auth/me", None)
            .await
        {
            Ok(response) => Ok(Some(response.user)),
            Err(e) if e.is_unauthorized() => Ok(None),
            Err(e) => Err(e),
        }
    }

    // === Locations ===

    /// Search the city list.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for a blank query without calling the
    /// server.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<CityMatch>, ClientError> {
        if query.trim().is_empty() {
            return Err(ClientError::Validation("Query parameter required".into()));
        }
        let mut url = self.endpoint("api/locations/search")?;
        url.query_pairs_mut().append_pair("q", query);
        fetch(self.inner.client.get(url)).await
    }

    /// The signed-in user's favorites with their latest weather.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 401 without a session.
    #[instrument(skip(self))]
    pub async fn favorites(&self) -> Result<Vec<FavoriteEntry>, ClientError> {
        self.send_json::<(), _>(Method::GET, "api/locations/favorites", None)
            .await
    }

    /// Mark a place as a favorite. Idempotent for the same place.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 401 without a session, or 400
    /// for invalid coordinates.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn add_favorite(&self, request: &AddFavoriteRequest) -> Result<Location, ClientError> {
        self.send_json(Method::POST, "api/locations/favorites", Some(request))
            .await
    }

    /// Remove a favorite owned by the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 when the location is
    /// missing or owned by someone else.
    #[instrument(skip(self))]
    pub async fn remove_favorite(&self, id: LocationId) -> Result<(), ClientError> {
        let path = format!("api/locations/favorites/{id}");
        let _: MessageResponse = self.send_json::<(), _>(Method::DELETE, &path, None).await?;
        Ok(())
    }

    // === Helpers ===

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ClientError::Validation(format!("invalid endpoint `{path}`: {e}")))
    }

    fn weather_url(&self, path: &str, coords: Coordinates) -> Result<Url, ClientError> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut()
            .append_pair("lat", &coords.lat().to_string())
            .append_pair("lon", &coords.lon().to_string());
        Ok(url)
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let mut request = self.inner.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        fetch(request).await
    }
}

/// Send a request and decode its JSON body.
async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = request.send().await?;
    Ok(check(response).await?.json().await?)
}

/// Turn a non-success response into `ClientError::Api`.
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!(status = %status, "API call failed");
    Err(ClientError::from_response(status, &body))
}

#[async_trait]
impl WeatherApi for ApiClient {
    #[instrument(skip(self))]
    async fn current_weather(
        &self,
        coords: Coordinates,
    ) -> Result<CurrentWeatherResponse, ClientError> {
        let url = self.weather_url("api/weather/current", coords)?;
        fetch(self.inner.client.get(url)).await
    }

    #[instrument(skip(self))]
    async fn forecast(&self, coords: Coordinates) -> Result<ForecastResponse, ClientError> {
        let url = self.weather_url("api/weather/forecast", coords)?;
        fetch(self.inner.client.get(url)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ClientConfig::new(base).unwrap()).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let api = client("https://example.com/nimbus");
        assert_eq!(
            api.endpoint("api/auth/me").unwrap().as_str(),
            "https://example.com/nimbus/api/auth/me"
        );
    }

    #[test]
    fn test_weather_url_encodes_coordinates() {
        let api = client("http://localhost:3000");
        let coords = Coordinates::new(37.7749, -122.4194).unwrap();
        let url = api.weather_url("api/weather/current", coords).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/api/weather/current?lat=37.7749&lon=-122.4194"
        );
    }

    #[tokio::test]
    async fn test_blank_search_is_rejected_locally() {
        // Nothing listens on this port; validation must fail before any I/O.
        let api = client("http://127.0.0.1:9");
        let err = api.search("   ").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
