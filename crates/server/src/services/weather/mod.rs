//! Weather lookups: fetch from the provider, resolve the location, store.
//!
//! The provider is always called first. If it fails nothing is written, so a
//! provider outage never leaves behind a location without weather.

mod provider;
mod simulated;

pub use provider::{CurrentObservation, ForecastFeed, ProviderError, WeatherProvider};
pub use simulated::{FORECAST_SAMPLES, SimulatedProvider};

use chrono::{FixedOffset, Offset, Utc};
use thiserror::Error;
use tracing::instrument;

use nimbus_core::api::{CurrentWeatherResponse, ForecastResponse};
use nimbus_core::{Coordinates, NewLocation, UserId, WeatherReading, aggregate_forecast};

use crate::db::{RepositoryError, Storage};

/// Errors from a weather lookup.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Weather lookups against one storage backend and one provider.
pub struct WeatherService<'a> {
    storage: &'a dyn Storage,
    provider: &'a dyn WeatherProvider,
}

impl<'a> WeatherService<'a> {
    #[must_use]
    pub const fn new(storage: &'a dyn Storage, provider: &'a dyn WeatherProvider) -> Self {
        Self { storage, provider }
    }

    /// Fetch current conditions and record them as the location's snapshot.
    ///
    /// An unknown location is created, owned by `owner` when a user is
    /// signed in.
    ///
    /// # Errors
    ///
    /// Returns `WeatherError::Provider` if the provider fails; nothing is
    /// stored in that case.
    #[instrument(skip(self))]
    pub async fn current(
        &self,
        coords: Coordinates,
        owner: Option<UserId>,
    ) -> Result<CurrentWeatherResponse, WeatherError> {
        let observation = self.provider.current(coords).await?;

        let location = self
            .storage
            .resolve_or_create(NewLocation::lookup(
                coords,
                observation.name.clone(),
                observation.country.clone(),
                owner,
            ))
            .await?;

        let weather = self
            .storage
            .record_snapshot(location.id, reading_from(observation))
            .await?;

        tracing::debug!(location_id = %location.id, snapshot_id = %weather.id, "Recorded snapshot");
        Ok(CurrentWeatherResponse { location, weather })
    }

    /// Fetch the forecast feed, aggregate it into days, and replace the
    /// location's stored forecast.
    ///
    /// # Errors
    ///
    /// Returns `WeatherError::Provider` if the provider fails; nothing is
    /// stored in that case.
    #[instrument(skip(self))]
    pub async fn forecast(
        &self,
        coords: Coordinates,
        owner: Option<UserId>,
    ) -> Result<ForecastResponse, WeatherError> {
        let feed = self.provider.forecast(coords).await?;

        let offset = FixedOffset::east_opt(feed.timezone_offset_seconds).unwrap_or_else(|| {
            tracing::warn!(
                offset = feed.timezone_offset_seconds,
                "Provider sent an out-of-range UTC offset, grouping by UTC"
            );
            Utc.fix()
        });
        let days = aggregate_forecast(&feed.samples, offset);

        let location = self
            .storage
            .resolve_or_create(NewLocation::lookup(coords, feed.name, feed.country, owner))
            .await?;

        let forecasts = self.storage.replace_forecast(location.id, days).await?;

        Ok(ForecastResponse {
            location,
            forecasts,
        })
    }
}

/// Convert a provider observation into a storable reading (visibility in km).
fn reading_from(observation: CurrentObservation) -> WeatherReading {
    WeatherReading {
        temperature: observation.temperature,
        feels_like: observation.feels_like,
        humidity: observation.humidity,
        pressure: observation.pressure,
        wind_speed: observation.wind_speed,
        wind_direction: observation.wind_direction,
        visibility: observation.visibility_m.map(|m| f64::from(m) / 1000.0),
        description: observation.description,
        icon: observation.icon,
        cloudiness: observation.cloudiness,
        uv_index: observation.uv_index,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::db::MemoryStorage;

    /// Provider that always fails.
    #[derive(Debug, Default)]
    pub(crate) struct DownProvider;

    #[async_trait]
    impl WeatherProvider for DownProvider {
        async fn current(&self, _: Coordinates) -> Result<CurrentObservation, ProviderError> {
            Err(ProviderError::Unavailable("connection refused".to_owned()))
        }

        async fn forecast(&self, _: Coordinates) -> Result<ForecastFeed, ProviderError> {
            Err(ProviderError::Unavailable("connection refused".to_owned()))
        }
    }

    fn sf() -> Coordinates {
        Coordinates::new(37.7749, -122.4194).unwrap()
    }

    #[tokio::test]
    async fn test_current_reuses_location_and_overwrites_snapshot() {
        let storage = MemoryStorage::new();
        let provider = SimulatedProvider::new();
        let service = WeatherService::new(&storage, &provider);

        let first = service.current(sf(), None).await.unwrap();
        let second = service.current(sf(), None).await.unwrap();

        assert_eq!(first.location.id, second.location.id);
        assert_eq!(first.location.name, "San Francisco");
        assert_eq!(first.location.user_id, None);
        assert!(!first.location.is_favorite);
        assert_ne!(first.weather.id, second.weather.id);
        assert_eq!(first.weather.reading.visibility, Some(10.0));

        let latest = storage
            .latest_snapshot(first.location.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, second.weather.id);
    }

    #[tokio::test]
    async fn test_current_assigns_owner_on_create() {
        let storage = MemoryStorage::new();
        let provider = SimulatedProvider::new();
        let service = WeatherService::new(&storage, &provider);

        let owner = UserId::new(3);
        let response = service.current(sf(), Some(owner)).await.unwrap();
        assert_eq!(response.location.user_id, Some(owner));
    }

    #[tokio::test]
    async fn test_forecast_stores_at_most_seven_days() {
        let storage = MemoryStorage::new();
        let provider = SimulatedProvider::new();
        let service = WeatherService::new(&storage, &provider);

        let response = service.forecast(sf(), None).await.unwrap();
        assert!(!response.forecasts.is_empty());
        assert!(response.forecasts.len() <= nimbus_core::MAX_FORECAST_DAYS);
        assert!(
            response
                .forecasts
                .windows(2)
                .all(|w| w[0].day.date < w[1].day.date)
        );

        let again = service.forecast(sf(), None).await.unwrap();
        assert_eq!(again.location.id, response.location.id);
        assert_eq!(
            storage.forecast(response.location.id).await.unwrap(),
            again.forecasts
        );
    }

    #[tokio::test]
    async fn test_provider_failure_stores_nothing() {
        let storage = MemoryStorage::new();
        let service = WeatherService::new(&storage, &DownProvider);

        assert!(matches!(
            service.current(sf(), None).await,
            Err(WeatherError::Provider(_))
        ));
        assert!(matches!(
            service.forecast(sf(), None).await,
            Err(WeatherError::Provider(_))
        ));
        assert!(storage.find_near(sf()).await.unwrap().is_none());
    }
}
