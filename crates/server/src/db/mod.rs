//! Persistence for users, locations, weather snapshots and forecasts.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - ordered maps plus monotonic id counters behind one
//!   lock. Used when no database URL is configured, and by tests.
//! - [`PgStorage`] - `PostgreSQL` via sqlx.
//!
//! Both implement [`Storage`], so handlers and services never know which one
//! is running.
//!
//! ## Tables (`PostgreSQL`)
//!
//! - `users` - Registered accounts with argon2 password hashes
//! - `locations` - Stored places, optionally owned, with the favorite flag
//! - `weather_snapshots` - One live reading per location
//! - `forecast_days` - Up to seven aggregated days per location
//! - `tower_sessions.session` - Session storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p nimbus-cli -- migrate
//! ```

mod memory;
mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use nimbus_core::{
    Coordinates, Email, ForecastDay, Location, LocationId, NewLocation, StoredForecastDay,
    UserId, WeatherReading, WeatherSnapshot,
};

use crate::models::{NewUser, User};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested record was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Storage abstraction shared by every backend.
///
/// Each method is a single logical operation: backends make it atomic with
/// respect to other callers.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Health ===

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    // === Users ===

    /// Insert a user.
    ///
    /// Returns `RepositoryError::Conflict` if the email or username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Get a user by ID.
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Get a user and their password hash by email.
    async fn credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    // === Locations ===

    /// Find the stored location matching `query` within tolerance.
    ///
    /// Ties between several matches go to the nearest, then the smallest id.
    async fn find_near(&self, query: Coordinates) -> Result<Option<Location>, RepositoryError>;

    /// Return the location matching `new.coordinates`, creating it from `new`
    /// when nothing matches.
    ///
    /// Lookup and insert are serialized, so concurrent identical calls yield
    /// one location.
    async fn resolve_or_create(&self, new: NewLocation) -> Result<Location, RepositoryError>;

    /// Get a location by ID.
    async fn location(&self, id: LocationId) -> Result<Option<Location>, RepositoryError>;

    /// All locations owned by `owner`, in id order.
    async fn locations_owned_by(&self, owner: UserId) -> Result<Vec<Location>, RepositoryError>;

    /// Flag a location as a favorite of `owner`, taking ownership of it.
    ///
    /// Returns `None` if the location does not exist.
    async fn mark_favorite(
        &self,
        id: LocationId,
        owner: UserId,
    ) -> Result<Option<Location>, RepositoryError>;

    /// Delete a location owned by `owner`, with its snapshot and forecast.
    ///
    /// Returns `false` and deletes nothing if the location is missing or
    /// owned by someone else.
    async fn delete_owned_location(
        &self,
        id: LocationId,
        owner: UserId,
    ) -> Result<bool, RepositoryError>;

    // === Weather ===

    /// Replace the live snapshot for a location.
    async fn record_snapshot(
        &self,
        location_id: LocationId,
        reading: WeatherReading,
    ) -> Result<WeatherSnapshot, RepositoryError>;

    /// The live snapshot for a location, if one was recorded.
    async fn latest_snapshot(
        &self,
        location_id: LocationId,
    ) -> Result<Option<WeatherSnapshot>, RepositoryError>;

    /// Replace every forecast day for a location in one step.
    ///
    /// Callers pass at most `MAX_FORECAST_DAYS` days; extra days are dropped.
    async fn replace_forecast(
        &self,
        location_id: LocationId,
        days: Vec<ForecastDay>,
    ) -> Result<Vec<StoredForecastDay>, RepositoryError>;

    /// The stored forecast for a location, in date order.
    async fn forecast(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<StoredForecastDay>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
