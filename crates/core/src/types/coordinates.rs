//! Geographic coordinates and tolerance matching.
//!
//! Two coordinate pairs name the "same place" when both the latitude and the
//! longitude differ by strictly less than [`COORDINATE_TOLERANCE`] degrees
//! (about 1.1 km at the equator). Matching is intentionally coarse: it is not
//! exact equality and not a great-circle distance.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Per-axis tolerance, in degrees, under which two coordinates match.
pub const COORDINATE_TOLERANCE: f64 = 0.01;

/// Slack subtracted from [`COORDINATE_TOLERANCE`] before comparing.
///
/// Differences such as `37.7849 - 37.7749` come out a hair under 0.01 in
/// binary floating point; pairs exactly one tolerance apart must not match.
pub const TOLERANCE_EPSILON: f64 = 1e-9;

/// The strict upper bound a per-axis difference is compared against.
pub const MATCH_THRESHOLD: f64 = COORDINATE_TOLERANCE - TOLERANCE_EPSILON;

/// Errors that can occur when constructing [`Coordinates`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum CoordinateError {
    /// Latitude is NaN, infinite, or outside [-90, 90].
    #[error("latitude must be between -90 and 90 degrees, got {0}")]
    Latitude(f64),
    /// Longitude is NaN, infinite, or outside [-180, 180].
    #[error("longitude must be between -180 and 180 degrees, got {0}")]
    Longitude(f64),
}

/// A validated latitude/longitude pair in decimal degrees.
///
/// # Examples
///
/// ```
/// use nimbus_core::Coordinates;
///
/// let sf = Coordinates::new(37.7749, -122.4194).unwrap();
/// let nearby = Coordinates::new(37.7800, -122.4150).unwrap();
/// let oakland = Coordinates::new(37.8044, -122.2712).unwrap();
///
/// assert!(sf.is_near(nearby));
/// assert!(!sf.is_near(oakland));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates", into = "RawCoordinates")]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

#[derive(Serialize, Deserialize)]
struct RawCoordinates {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lon)
    }
}

impl From<Coordinates> for RawCoordinates {
    fn from(c: Coordinates) -> Self {
        Self {
            lat: c.lat,
            lon: c.lon,
        }
    }
}

impl Coordinates {
    /// Create coordinates from decimal degrees.
    ///
    /// # Errors
    ///
    /// Returns `CoordinateError` if either component is not finite or is out
    /// of range.
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::Latitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::Longitude(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Build coordinates from literal degrees in a `const` context.
    ///
    /// # Panics
    ///
    /// Panics if either component is out of range. In a `const` item this
    /// is a compile error.
    #[must_use]
    #[allow(clippy::manual_range_contains)]
    pub const fn from_const(lat: f64, lon: f64) -> Self {
        assert!(lat >= -90.0 && lat <= 90.0, "latitude out of range");
        assert!(lon >= -180.0 && lon <= 180.0, "longitude out of range");
        Self { lat, lon }
    }

    /// Build coordinates from values that were validated before being stored.
    pub(crate) const fn from_stored(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn lon(self) -> f64 {
        self.lon
    }

    /// Whether `other` is within [`COORDINATE_TOLERANCE`] on both axes.
    #[must_use]
    pub fn is_near(self, other: Self) -> bool {
        (self.lat - other.lat).abs() < MATCH_THRESHOLD
            && (self.lon - other.lon).abs() < MATCH_THRESHOLD
    }

    /// Squared Euclidean distance in degree space.
    ///
    /// Only meaningful for ranking nearby candidates against each other.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dlat = self.lat - other.lat;
        let dlon = self.lon - other.lon;
        dlat.mul_add(dlat, dlon * dlon)
    }

    /// The 0.01-degree grid cell containing these coordinates.
    ///
    /// Used as a lock key when serializing lookups for the same area.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn bucket(self) -> (i32, i32) {
        // Range checks in `new` keep both products within i32.
        (
            (self.lat * 100.0).floor() as i32,
            (self.lon * 100.0).floor() as i32,
        )
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert_eq!(
            Coordinates::new(90.5, 0.0),
            Err(CoordinateError::Latitude(90.5))
        );
        assert_eq!(
            Coordinates::new(0.0, -180.01),
            Err(CoordinateError::Longitude(-180.01))
        );
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(0.0, f64::INFINITY).is_err());
        assert!(Coordinates::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_from_const_matches_new() {
        const PARIS: Coordinates = Coordinates::from_const(48.8566, 2.3522);
        assert_eq!(PARIS, at(48.8566, 2.3522));
    }

    #[test]
    #[should_panic(expected = "latitude out of range")]
    fn test_from_const_panics_at_runtime_on_bad_input() {
        let lat = std::hint::black_box(91.0);
        let _ = Coordinates::from_const(lat, 0.0);
    }

    #[test]
    fn test_is_near_requires_both_axes() {
        let origin = at(10.0, 20.0);
        assert!(origin.is_near(at(10.009, 20.009)));
        assert!(origin.is_near(at(9.991, 19.991)));
        assert!(!origin.is_near(at(10.02, 20.0)));
        assert!(!origin.is_near(at(10.0, 20.02)));
    }

    #[test]
    fn test_tolerance_is_strict() {
        let origin = at(0.0, 0.0);
        assert!(!origin.is_near(at(0.0, 0.015)));
        assert!(!origin.is_near(at(0.011, 0.0)));
        assert!(origin.is_near(at(0.0099, -0.0099)));
    }

    #[test]
    fn test_exactly_one_tolerance_apart_is_not_near() {
        // 37.7849 - 37.7749 evaluates to 0.009999999999998.
        assert!(!at(37.7749, -122.4194).is_near(at(37.7849, -122.4194)));
        assert!(!at(10.0, 20.0).is_near(at(10.01, 20.0)));
        assert!(!at(10.0, 20.0).is_near(at(10.0, 19.99)));
        assert!(!at(-33.8688, 151.2093).is_near(at(-33.8788, 151.2193)));
        assert!(at(37.7749, -122.4194).is_near(at(37.7848, -122.4194)));
    }

    #[test]
    fn test_distance_ranks_candidates() {
        let query = at(37.7749, -122.4194);
        let close = at(37.7750, -122.4195);
        let far = at(37.7800, -122.4150);
        assert!(query.distance_squared(close) < query.distance_squared(far));
    }

    #[test]
    fn test_bucket() {
        assert_eq!(at(37.7749, -122.4194).bucket(), (3777, -12242));
        assert_eq!(at(0.0, 0.0).bucket(), (0, 0));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<Coordinates, _> = serde_json::from_str(r#"{"lat":1.5,"lon":2.5}"#);
        assert_eq!(ok.unwrap(), at(1.5, 2.5));

        let bad: Result<Coordinates, _> = serde_json::from_str(r#"{"lat":95,"lon":0}"#);
        assert!(bad.is_err());
    }
}
