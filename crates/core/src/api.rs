//! Request and response bodies for the `/api` REST surface.
//!
//! The server serializes these and the client deserializes them, so both ends
//! agree on field names (camelCase) without duplicating structs.

use serde::{Deserialize, Serialize};

use crate::types::{
    Email, Location, StoredForecastDay, UserId, Username, WeatherSnapshot,
};

// =============================================================================
// Auth
// =============================================================================

/// `POST /api/auth/register` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/login` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub email: Email,
    pub username: Username,
}

/// Body returned by register, login and me.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserSummary,
}

/// Generic `{ "message": ... }` body, used for errors and acknowledgements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Search
// =============================================================================

/// One city returned by `GET /api/locations/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityMatch {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

// =============================================================================
// Weather
// =============================================================================

/// `GET /api/weather/current` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherResponse {
    pub location: Location,
    pub weather: WeatherSnapshot,
}

/// `GET /api/weather/forecast` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub location: Location,
    pub forecasts: Vec<StoredForecastDay>,
}

// =============================================================================
// Favorites
// =============================================================================

/// `POST /api/locations/favorites` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddFavoriteRequest {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub country: String,
}

/// One entry of `GET /api/locations/favorites`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub location: Location,
    pub weather: Option<WeatherSnapshot>,
}
