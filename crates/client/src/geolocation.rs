//! Device position lookup with a bounded wait and a fixed fallback.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use nimbus_core::Coordinates;

/// How long to wait for the device before falling back.
pub const GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Label used for a position reported by the device.
pub const DEVICE_LOCATION_LABEL: &str = "Current Location";

/// Label of the fallback location.
pub const FALLBACK_LABEL: &str = "San Francisco, CA";

/// Shown when the fallback replaces the device position.
pub const FALLBACK_NOTICE: &str = "Unable to access your location. Showing default location.";

/// Fallback coordinates (San Francisco).
pub const FALLBACK_COORDINATES: Coordinates = Coordinates::from_const(37.7749, -122.4194);

/// Why the device position could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location unavailable")]
    Unavailable,
    #[error("location request timed out")]
    Timeout,
}

/// Source of the device position.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

/// Reports a fixed position, e.g. one passed on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinates);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// A device without positioning.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocator;

#[async_trait]
impl Geolocator for NoGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unavailable)
    }
}

/// A place picked for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedLocation {
    pub coordinates: Coordinates,
    pub label: String,
}

impl SelectedLocation {
    #[must_use]
    pub fn new(coordinates: Coordinates, label: impl Into<String>) -> Self {
        Self {
            coordinates,
            label: label.into(),
        }
    }

    /// The San Francisco fallback.
    #[must_use]
    pub fn fallback() -> Self {
        Self::new(FALLBACK_COORDINATES, FALLBACK_LABEL)
    }
}

/// Result of locating the device: where to look, plus a notice when the
/// fallback was used.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub location: SelectedLocation,
    pub notice: Option<&'static str>,
}

/// Ask `geolocator` for a position, waiting at most `timeout`.
///
/// Any failure, including the timeout, resolves to the fallback location
/// with [`FALLBACK_NOTICE`]. Never fails.
pub async fn locate_or_fallback(geolocator: &dyn Geolocator, timeout: Duration) -> Located {
    let outcome = tokio::time::timeout(timeout, geolocator.locate())
        .await
        .unwrap_or(Err(GeolocationError::Timeout));

    match outcome {
        Ok(coordinates) => {
            info!(lat = coordinates.lat(), lon = coordinates.lon(), "Device located");
            Located {
                location: SelectedLocation::new(coordinates, DEVICE_LOCATION_LABEL),
                notice: None,
            }
        }
        Err(e) => {
            warn!(error = %e, "Geolocation failed, using fallback location");
            Located {
                location: SelectedLocation::fallback(),
                notice: Some(FALLBACK_NOTICE),
            }
        }
    }
}
