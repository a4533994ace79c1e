//! Weather provider seam.
//!
//! A provider answers two questions about a coordinate: what it is like now
//! and what the next few days look like. Shapes follow the OpenWeather
//! current and 5-day/3-hour endpoints, already decoded.

use async_trait::async_trait;
use thiserror::Error;

use nimbus_core::{Coordinates, ForecastSample};

/// Errors raised by a weather provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider could not be reached or refused the request.
    #[error("weather provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with something we could not use.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Current conditions as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentObservation {
    /// Place name the provider associates with the coordinates.
    pub name: String,
    /// ISO country code.
    pub country: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i32,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: Option<i32>,
    /// Visibility in metres.
    pub visibility_m: Option<u32>,
    pub description: String,
    pub icon: String,
    pub cloudiness: Option<i32>,
    pub uv_index: Option<f64>,
}

/// Fixed-interval forecast samples for a place.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastFeed {
    pub name: String,
    pub country: String,
    /// Offset of the place's local time from UTC.
    pub timezone_offset_seconds: i32,
    pub samples: Vec<ForecastSample>,
}

/// A source of weather data.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions at `coords`.
    async fn current(&self, coords: Coordinates) -> Result<CurrentObservation, ProviderError>;

    /// Multi-day forecast samples for `coords`.
    async fn forecast(&self, coords: Coordinates) -> Result<ForecastFeed, ProviderError>;
}
