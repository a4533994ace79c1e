//! Current conditions and forecast handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use nimbus_core::Coordinates;
use nimbus_core::api::{CurrentWeatherResponse, ForecastResponse};

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::services::{LocationError, WeatherService};
use crate::state::AppState;

/// `?lat=&lon=` query. Kept as strings so a missing or malformed value
/// becomes our own 400 rather than a generic rejection.
#[derive(Debug, Deserialize)]
pub struct CoordinateQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

impl CoordinateQuery {
    fn coordinates(&self) -> Result<Coordinates> {
        let required = || AppError::BadRequest("Latitude and longitude required".to_owned());
        let parse = |raw: &Option<String>| -> Result<f64> {
            let raw = raw.as_deref().map(str::trim).filter(|s| !s.is_empty());
            raw.ok_or_else(required)?
                .parse::<f64>()
                .map_err(|_| AppError::BadRequest("Latitude and longitude must be numbers".to_owned()))
        };

        let lat = parse(&self.lat)?;
        let lon = parse(&self.lon)?;
        Coordinates::new(lat, lon).map_err(|e| AppError::Location(LocationError::from(e)))
    }
}

/// `GET /api/weather/current?lat=&lon=`
///
/// # Errors
///
/// 400 for missing or invalid coordinates; 500 if the provider fails.
#[instrument(skip(state, auth))]
pub async fn current(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Query(query): Query<CoordinateQuery>,
) -> Result<Json<CurrentWeatherResponse>> {
    let coords = query.coordinates()?;

    let response = WeatherService::new(state.storage(), state.provider())
        .current(coords, auth.user_id())
        .await
        .map_err(|e| AppError::weather("Failed to fetch weather data", e))?;
    Ok(Json(response))
}

/// `GET /api/weather/forecast?lat=&lon=`
///
/// # Errors
///
/// 400 for missing or invalid coordinates; 500 if the provider fails.
#[instrument(skip(state, auth))]
pub async fn forecast(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Query(query): Query<CoordinateQuery>,
) -> Result<Json<ForecastResponse>> {
    let coords = query.coordinates()?;

    let response = WeatherService::new(state.storage(), state.provider())
        .forecast(coords, auth.user_id())
        .await
        .map_err(|e| AppError::weather("Failed to fetch forecast data", e))?;
    Ok(Json(response))
}
