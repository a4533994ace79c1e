//! One-shot terminal dashboard.
//!
//! Runs a dashboard session once: locate (the `--lat/--lon` pair stands in
//! for the device), fetch current conditions and the forecast together, then
//! print both with the favorites of whichever backend applies.

use tracing::warn;

use nimbus_client::{
    ApiClient, DashboardSession, FixedGeolocator, GEOLOCATION_TIMEOUT, Geolocator, NoGeolocator,
    fetch_dashboard,
};
use nimbus_core::Coordinates;

use super::{CommandResult, Credentials, emit, favorites_backend, render};

/// Show the dashboard for `position`, or the fallback location.
///
/// Weather and favorites failures are printed in place; only setup errors
/// abort the command.
///
/// # Errors
///
/// Returns an error if the local storage location cannot be determined.
pub async fn run(
    api: &ApiClient,
    position: Option<Coordinates>,
    credentials: &Credentials,
) -> CommandResult {
    let geolocator: Box<dyn Geolocator> = match position {
        Some(coords) => Box::new(FixedGeolocator(coords)),
        None => Box::new(NoGeolocator),
    };

    let mut session = DashboardSession::new();
    let ticket = session.start(geolocator.as_ref(), GEOLOCATION_TIMEOUT).await;
    if let Some(notice) = session.notice() {
        emit(notice);
    }

    let outcome = fetch_dashboard(api, ticket).await;
    if !session.apply(outcome) {
        warn!("Dashboard selection changed during fetch");
    }

    if let Some(dashboard) = session.dashboard() {
        emit(&format!("== {} ==", dashboard.location.label));
        match &dashboard.current {
            Ok(current) => emit(&render::current(current)),
            Err(e) => emit(&render::failure("Current weather", e)),
        }
        emit("");
        match &dashboard.forecast {
            Ok(forecast) => emit(&render::forecast(forecast)),
            Err(e) => emit(&render::failure("Forecast", e)),
        }
    }

    emit("");
    let (backend, _) = favorites_backend(api, credentials).await?;
    match backend.list().await {
        Ok(views) => emit(&render::favorites(&views, backend.kind())),
        Err(e) => emit(&render::failure("Favorites", &e)),
    }

    Ok(())
}
