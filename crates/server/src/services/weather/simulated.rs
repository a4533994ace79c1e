//! Offline provider producing plausible, latitude-dependent weather.
//!
//! Temperatures centre on `20 + 15 * sin(lat / 10)` with random jitter, so
//! repeated calls for one place differ while staying in a realistic band.

use async_trait::async_trait;
use chrono::{DateTime, Duration, DurationRound, Utc};
use rand::Rng;

use nimbus_core::{Coordinates, ForecastSample};

use super::provider::{CurrentObservation, ForecastFeed, ProviderError, WeatherProvider};
use crate::services::gazetteer;

/// Number of three-hour samples in a simulated feed (seven days).
pub const FORECAST_SAMPLES: i64 = 56;

const SAMPLE_INTERVAL_HOURS: i64 = 3;

/// (description, icon) pairs, in OpenWeather condition order.
const CONDITIONS: [(&str, &str); 5] = [
    ("clear sky", "01d"),
    ("few clouds", "02d"),
    ("scattered clouds", "03d"),
    ("light rain", "10d"),
    ("thunderstorm with light rain", "11d"),
];

/// Provider that never leaves the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedProvider;

impl SimulatedProvider {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WeatherProvider for SimulatedProvider {
    async fn current(&self, coords: Coordinates) -> Result<CurrentObservation, ProviderError> {
        Ok(simulate_current(&mut rand::rng(), coords))
    }

    async fn forecast(&self, coords: Coordinates) -> Result<ForecastFeed, ProviderError> {
        Ok(simulate_forecast(&mut rand::rng(), coords, Utc::now()))
    }
}

fn base_temperature(coords: Coordinates) -> f64 {
    (coords.lat() * 0.1).sin().mul_add(15.0, 20.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Condition picked from the coordinates, so one place keeps its sky.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::indexing_slicing
)]
fn condition_for(coords: Coordinates) -> (&'static str, &'static str) {
    let index = ((coords.lat() + coords.lon()).abs() * 10.0).floor() as usize % CONDITIONS.len();
    CONDITIONS[index]
}

/// UTC offset approximated from longitude, in whole hours.
#[allow(clippy::cast_possible_truncation)]
fn offset_seconds(coords: Coordinates) -> i32 {
    (coords.lon() / 15.0).round() as i32 * 3600
}

fn simulate_current<R: Rng>(rng: &mut R, coords: Coordinates) -> CurrentObservation {
    let base = base_temperature(coords);
    let (description, icon) = condition_for(coords);

    CurrentObservation {
        name: gazetteer::nearest_city_name(coords).to_owned(),
        country: gazetteer::country_code(coords).to_owned(),
        temperature: round1(base + rng.random_range(-2.5..2.5)),
        feels_like: round1(base + rng.random_range(-1.5..1.5)),
        humidity: rng.random_range(50..80),
        pressure: (1013.0 + rng.random_range(-10.0..10.0_f64)).round(),
        wind_speed: round1(rng.random_range(2.0..12.0)),
        wind_direction: Some(rng.random_range(0..360)),
        visibility_m: Some(10_000),
        description: description.to_owned(),
        icon: icon.to_owned(),
        cloudiness: Some(rng.random_range(0..100)),
        uv_index: None,
    }
}

#[allow(clippy::indexing_slicing)]
fn simulate_forecast<R: Rng>(rng: &mut R, coords: Coordinates, now: DateTime<Utc>) -> ForecastFeed {
    let base = base_temperature(coords);
    let start = now
        .duration_trunc(Duration::hours(SAMPLE_INTERVAL_HOURS))
        .unwrap_or(now);

    let samples = (0..FORECAST_SAMPLES)
        .map(|i| {
            let (description, icon) = CONDITIONS[rng.random_range(0..CONDITIONS.len())];
            let temp = base + rng.random_range(-5.0..5.0);
            ForecastSample {
                timestamp: start + Duration::hours(i * SAMPLE_INTERVAL_HOURS),
                temp_min: round1(temp - 3.0),
                temp_max: round1(temp + 4.0),
                humidity: rng.random_range(50..80),
                wind_speed: round1(rng.random_range(2.0..12.0)),
                description: description.to_owned(),
                icon: icon.to_owned(),
                pop: rng.random_range(0.0..0.8),
                rain: (rng.random::<f64>() > 0.7).then(|| round1(rng.random_range(0.0..5.0))),
                snow: None,
            }
        })
        .collect();

    ForecastFeed {
        name: gazetteer::nearest_city_name(coords).to_owned(),
        country: gazetteer::country_code(coords).to_owned(),
        timezone_offset_seconds: offset_seconds(coords),
        samples,
    }
}
