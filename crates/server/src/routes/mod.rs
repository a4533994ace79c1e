//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Liveness
//! GET    /health/ready                 - Storage readiness
//!
//! # Auth
//! POST   /api/auth/register            - Create account, sign in
//! POST   /api/auth/login               - Sign in
//! POST   /api/auth/logout              - Sign out
//! GET    /api/auth/me                  - Current user
//!
//! # Locations
//! GET    /api/locations/search?q=      - Built-in city search
//! GET    /api/locations/favorites      - Favorites with live weather (auth)
//! POST   /api/locations/favorites      - Add favorite (auth)
//! DELETE /api/locations/favorites/{id} - Remove favorite (auth)
//!
//! # Weather
//! GET    /api/weather/current?lat=&lon=  - Current conditions
//! GET    /api/weather/forecast?lat=&lon= - Daily forecast
//! ```

pub mod auth;
pub mod health;
pub mod locations;
pub mod weather;

use std::time::Duration;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionStore;
use tracing::Span;

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the location routes router.
pub fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(locations::search))
        .route(
            "/favorites",
            get(locations::list_favorites).post(locations::add_favorite),
        )
        .route("/favorites/{id}", delete(locations::remove_favorite))
}

/// Create the weather routes router.
pub fn weather_routes() -> Router<AppState> {
    Router::new()
        .route("/current", get(weather::current))
        .route("/forecast", get(weather::forecast))
}

/// Create all `/api` routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/locations", location_routes())
        .nest("/weather", weather_routes())
}

/// Build the complete application: health probes, the API, sessions over
/// `store`, request ids, tracing and Sentry.
pub fn app<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(store, state.config());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", routes())
        .layer(session_layer)
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
