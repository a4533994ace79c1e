//! Dashboard session: which place is shown and what is known about it.
//!
//! ```text
//! Idle -> LocatingDevice -> LocationResolved -> FetchingWeather -> Ready
//!                                                     ^              |
//!                                                     +-- select ----+
//! ```
//!
//! Every selection bumps a counter and hands out a [`FetchTicket`]. Fetch
//! results come back as a [`FetchOutcome`] carrying that ticket, and
//! [`DashboardSession::apply`] drops any outcome whose selection is no longer
//! current. In-flight requests are not cancelled; their results are ignored.

use std::time::Duration;

use tracing::{debug, instrument};

use nimbus_core::api::{CurrentWeatherResponse, ForecastResponse};

use crate::api::WeatherApi;
use crate::error::ClientError;
use crate::geolocation::{Geolocator, SelectedLocation, locate_or_fallback};

/// Everything shown for one location.
///
/// Current conditions and the forecast succeed or fail independently.
#[derive(Debug)]
pub struct Dashboard {
    pub location: SelectedLocation,
    pub current: Result<CurrentWeatherResponse, ClientError>,
    pub forecast: Result<ForecastResponse, ClientError>,
}

/// Where the session is.
#[derive(Debug, Default)]
pub enum SessionState {
    #[default]
    Idle,
    LocatingDevice,
    LocationResolved(SelectedLocation),
    FetchingWeather(SelectedLocation),
    Ready(Dashboard),
}

impl SessionState {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LocatingDevice => "locating_device",
            Self::LocationResolved(_) => "location_resolved",
            Self::FetchingWeather(_) => "fetching_weather",
            Self::Ready(_) => "ready",
        }
    }
}

/// Permission to fetch weather for one selection.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    selection: u64,
    location: SelectedLocation,
}

impl FetchTicket {
    /// Selection number this ticket was issued for.
    #[must_use]
    pub const fn selection(&self) -> u64 {
        self.selection
    }

    /// Location the fetch is for.
    #[must_use]
    pub const fn location(&self) -> &SelectedLocation {
        &self.location
    }
}

/// Both responses for a ticket.
#[derive(Debug)]
pub struct FetchOutcome {
    pub ticket: FetchTicket,
    pub current: Result<CurrentWeatherResponse, ClientError>,
    pub forecast: Result<ForecastResponse, ClientError>,
}

/// Client-side dashboard state machine.
#[derive(Debug, Default)]
pub struct DashboardSession {
    state: SessionState,
    selection: u64,
    notice: Option<&'static str>,
}

impl DashboardSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Number of the current selection (0 before the first).
    #[must_use]
    pub const fn selection(&self) -> u64 {
        self.selection
    }

    /// Informational message from the last device lookup, if it fell back.
    #[must_use]
    pub const fn notice(&self) -> Option<&'static str> {
        self.notice
    }

    /// The displayed dashboard, once a fetch for the current selection has
    /// been applied.
    #[must_use]
    pub const fn dashboard(&self) -> Option<&Dashboard> {
        match &self.state {
            SessionState::Ready(dashboard) => Some(dashboard),
            _ => None,
        }
    }

    /// Locate the device (or fall back) and select the result.
    #[instrument(skip(self, geolocator))]
    pub async fn start(&mut self, geolocator: &dyn Geolocator, timeout: Duration) -> FetchTicket {
        self.state = SessionState::LocatingDevice;
        let located = locate_or_fallback(geolocator, timeout).await;
        self.notice = located.notice;
        self.state = SessionState::LocationResolved(located.location.clone());
        self.select(located.location)
    }

    /// Show `location`, superseding any earlier selection.
    pub fn select(&mut self, location: SelectedLocation) -> FetchTicket {
        self.selection += 1;
        debug!(
            selection = self.selection,
            from = self.state.name(),
            label = %location.label,
            "Location selected"
        );
        self.state = SessionState::FetchingWeather(location.clone());
        FetchTicket {
            selection: self.selection,
            location,
        }
    }

    /// Apply a finished fetch. Returns `false` and leaves the state alone if
    /// the outcome belongs to a superseded selection.
    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        if outcome.ticket.selection != self.selection {
            debug!(
                stale = outcome.ticket.selection,
                current = self.selection,
                "Discarding stale weather result"
            );
            return false;
        }
        self.state = SessionState::Ready(Dashboard {
            location: outcome.ticket.location,
            current: outcome.current,
            forecast: outcome.forecast,
        });
        true
    }
}

/// Fetch current conditions and the forecast for `ticket` concurrently.
pub async fn fetch_dashboard(api: &dyn WeatherApi, ticket: FetchTicket) -> FetchOutcome {
    let coords = ticket.location.coordinates;
    let (current, forecast) = tokio::join!(api.current_weather(coords), api.forecast(coords));
    FetchOutcome {
        ticket,
        current,
        forecast,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Barrier;

    use nimbus_core::{
        Coordinates, Location, LocationId, SnapshotId, WeatherReading, WeatherSnapshot,
    };

    use crate::geolocation::{FALLBACK_NOTICE, FixedGeolocator, NoGeolocator};

    fn location_at(coords: Coordinates) -> Location {
        Location {
            id: LocationId::new(1),
            user_id: None,
            name: "Somewhere".to_string(),
            country: "XX".to_string(),
            lat: coords.lat(),
            lon: coords.lon(),
            is_favorite: false,
            created_at: Utc::now(),
        }
    }

    fn current_at(coords: Coordinates) -> CurrentWeatherResponse {
        CurrentWeatherResponse {
            location: location_at(coords),
            weather: WeatherSnapshot {
                id: SnapshotId::new(1),
                location_id: LocationId::new(1),
                reading: WeatherReading {
                    temperature: 18.0,
                    feels_like: 17.0,
                    humidity: 60,
                    pressure: 1013.0,
                    wind_speed: 3.5,
                    wind_direction: Some(270),
                    visibility: Some(10.0),
                    description: "clear sky".to_string(),
                    icon: "01d".to_string(),
                    cloudiness: Some(0),
                    uv_index: None,
                },
                timestamp: Utc::now(),
            },
        }
    }

    /// Scripted API: current always succeeds, forecast fails on request.
    struct FakeApi {
        fail_forecast: bool,
        barrier: Option<Barrier>,
    }

    impl FakeApi {
        const fn ok() -> Self {
            Self {
                fail_forecast: false,
                barrier: None,
            }
        }

        async fn rendezvous(&self) {
            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }
        }
    }

    #[async_trait]
    impl WeatherApi for FakeApi {
        async fn current_weather(
            &self,
            coords: Coordinates,
        ) -> Result<CurrentWeatherResponse, ClientError> {
            self.rendezvous().await;
            Ok(current_at(coords))
        }

        async fn forecast(&self, coords: Coordinates) -> Result<ForecastResponse, ClientError> {
            self.rendezvous().await;
            if self.fail_forecast {
                return Err(ClientError::Api {
                    status: 500,
                    message: "Failed to fetch forecast data".to_string(),
                });
            }
            Ok(ForecastResponse {
                location: location_at(coords),
                forecasts: Vec::new(),
            })
        }
    }

    fn place(lat: f64, lon: f64, label: &str) -> SelectedLocation {
        SelectedLocation::new(Coordinates::new(lat, lon).unwrap(), label)
    }

    #[tokio::test]
    async fn test_start_with_device_position() {
        let here = Coordinates::new(40.7128, -74.006).unwrap();
        let mut session = DashboardSession::new();
        assert!(matches!(session.state(), SessionState::Idle));

        let ticket = session
            .start(&FixedGeolocator(here), Duration::from_secs(10))
            .await;
        assert_eq!(ticket.selection(), 1);
        assert_eq!(ticket.location().coordinates, here);
        assert!(matches!(session.state(), SessionState::FetchingWeather(_)));
        assert!(session.notice().is_none());

        let outcome = fetch_dashboard(&FakeApi::ok(), ticket).await;
        assert!(session.apply(outcome));
        let dashboard = session.dashboard().unwrap();
        assert!(dashboard.current.is_ok());
        assert!(dashboard.forecast.is_ok());
    }

    #[tokio::test]
    async fn test_start_without_device_sets_notice() {
        let mut session = DashboardSession::new();
        let ticket = session.start(&NoGeolocator, Duration::from_secs(10)).await;
        assert_eq!(ticket.location(), &SelectedLocation::fallback());
        assert_eq!(session.notice(), Some(FALLBACK_NOTICE));
    }

    #[tokio::test]
    async fn test_stale_outcome_is_discarded() {
        let api = FakeApi::ok();
        let mut session = DashboardSession::new();

        let tokyo = session.select(place(35.6762, 139.6503, "Tokyo"));
        let paris = session.select(place(48.8566, 2.3522, "Paris"));

        let tokyo_outcome = fetch_dashboard(&api, tokyo).await;
        let paris_outcome = fetch_dashboard(&api, paris).await;

        // Tokyo arrives first but Paris is selected.
        assert!(!session.apply(tokyo_outcome));
        assert!(matches!(
            session.state(),
            SessionState::FetchingWeather(loc) if loc.label == "Paris"
        ));

        assert!(session.apply(paris_outcome));
        assert_eq!(session.dashboard().unwrap().location.label, "Paris");
    }

    #[tokio::test]
    async fn test_late_outcome_does_not_replace_ready_dashboard() {
        let api = FakeApi::ok();
        let mut session = DashboardSession::new();

        let first = session.select(place(51.5074, -0.1278, "London"));
        let second = session.select(place(52.52, 13.405, "Berlin"));
        assert!(session.apply(fetch_dashboard(&api, second).await));
        assert!(!session.apply(fetch_dashboard(&api, first).await));

        assert_eq!(session.dashboard().unwrap().location.label, "Berlin");
    }

    #[tokio::test]
    async fn test_ready_to_fetching_on_new_selection() {
        let api = FakeApi::ok();
        let mut session = DashboardSession::new();
        let ticket = session.select(place(1.0, 1.0, "A"));
        assert!(session.apply(fetch_dashboard(&api, ticket).await));
        assert!(matches!(session.state(), SessionState::Ready(_)));

        session.select(place(2.0, 2.0, "B"));
        assert!(matches!(session.state(), SessionState::FetchingWeather(_)));
        assert!(session.dashboard().is_none());
    }

    #[tokio::test]
    async fn test_partial_failure_is_reported_per_request() {
        let api = FakeApi {
            fail_forecast: true,
            barrier: None,
        };
        let mut session = DashboardSession::new();
        let ticket = session.select(place(34.0522, -118.2437, "Los Angeles"));
        assert!(session.apply(fetch_dashboard(&api, ticket).await));

        let dashboard = session.dashboard().unwrap();
        assert!(dashboard.current.is_ok());
        assert_eq!(dashboard.forecast.as_ref().unwrap_err().status(), Some(500));
    }

    #[tokio::test]
    async fn test_requests_run_concurrently() {
        // Each request waits for the other; sequential calls would hang.
        let api = FakeApi {
            fail_forecast: false,
            barrier: Some(Barrier::new(2)),
        };
        let ticket = DashboardSession::new().select(place(1.0, 1.0, "A"));
        let outcome = tokio::time::timeout(Duration::from_secs(5), fetch_dashboard(&api, ticket))
            .await
            .unwrap();
        assert!(outcome.current.is_ok());
        assert!(outcome.forecast.is_ok());
    }
}
