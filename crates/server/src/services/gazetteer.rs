//! Built-in city list used for search and for naming coordinates.
//!
//! This stands in for a geocoding API: a fixed table of well-known cities plus
//! coarse country bounding boxes.

use nimbus_core::Coordinates;
use nimbus_core::api::CityMatch;

/// Maximum number of search results.
pub const MAX_SEARCH_RESULTS: usize = 5;

/// Country code used when no bounding box matches.
pub const UNKNOWN_COUNTRY: &str = "XX";

struct City {
    name: &'static str,
    country: &'static str,
    lat: f64,
    lon: f64,
    /// Whether this city is a candidate when naming arbitrary coordinates.
    landmark: bool,
}

const fn city(name: &'static str, country: &'static str, lat: f64, lon: f64) -> City {
    City {
        name,
        country,
        lat,
        lon,
        landmark: false,
    }
}

const fn landmark(name: &'static str, country: &'static str, lat: f64, lon: f64) -> City {
    City {
        name,
        country,
        lat,
        lon,
        landmark: true,
    }
}

static CITIES: [City; 20] = [
    landmark("New York", "US", 40.7128, -74.0060),
    landmark("London", "GB", 51.5074, -0.1278),
    landmark("Tokyo", "JP", 35.6762, 139.6503),
    landmark("Paris", "FR", 48.8566, 2.3522),
    landmark("Sydney", "AU", -33.8688, 151.2093),
    landmark("San Francisco", "US", 37.7749, -122.4194),
    city("Los Angeles", "US", 34.0522, -118.2437),
    city("Chicago", "US", 41.8781, -87.6298),
    landmark("Mumbai", "IN", 19.0760, 72.8777),
    landmark("Berlin", "DE", 52.5200, 13.4050),
    city("Toronto", "CA", 43.6532, -79.3832),
    city("Dubai", "AE", 25.2048, 55.2708),
    city("Singapore", "SG", 1.3521, 103.8198),
    city("Hong Kong", "HK", 22.3193, 114.1694),
    city("Moscow", "RU", 55.7558, 37.6176),
    city("Barcelona", "ES", 41.3851, 2.1734),
    city("Rome", "IT", 41.9028, 12.4964),
    city("Amsterdam", "NL", 52.3676, 4.9041),
    city("Seoul", "KR", 37.5665, 126.9780),
    city("Bangkok", "TH", 13.7563, 100.5018),
];

/// Cities whose name or country code contains `query`, ignoring case.
///
/// Returns at most [`MAX_SEARCH_RESULTS`] matches in table order.
#[must_use]
pub fn search(query: &str) -> Vec<CityMatch> {
    let needle = query.trim().to_lowercase();
    CITIES
        .iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&needle) || c.country.to_lowercase().contains(&needle)
        })
        .take(MAX_SEARCH_RESULTS)
        .map(|c| CityMatch {
            name: c.name.to_owned(),
            country: c.country.to_owned(),
            lat: c.lat,
            lon: c.lon,
        })
        .collect()
}

/// Name of the landmark city closest to `coords` by Manhattan distance.
#[must_use]
pub fn nearest_city_name(coords: Coordinates) -> &'static str {
    let distance = |c: &City| (coords.lat() - c.lat).abs() + (coords.lon() - c.lon).abs();

    // `min_by` keeps the first of equals, so table order breaks ties.
    CITIES
        .iter()
        .filter(|c| c.landmark)
        .min_by(|a, b| distance(a).total_cmp(&distance(b)))
        .map_or("Unknown", |c| c.name)
}

/// Coarse ISO country code for `coords` from fixed bounding boxes.
///
/// Boxes are checked in order and overlap: Canada wins over the US for the
/// far north-east.
#[must_use]
pub fn country_code(coords: Coordinates) -> &'static str {
    let (lat, lon) = (coords.lat(), coords.lon());
    let within = |lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64| {
        lat > lat_min && lat < lat_max && lon > lon_min && lon < lon_max
    };

    if lat > 45.0 && lon < -60.0 {
        "CA"
    } else if within(25.0, 50.0, -125.0, -65.0) {
        "US"
    } else if within(35.0, 70.0, -10.0, 40.0) {
        "GB"
    } else if within(30.0, 45.0, 100.0, 145.0) {
        "JP"
    } else if within(-45.0, -10.0, 110.0, 155.0) {
        "AU"
    } else if within(5.0, 35.0, 68.0, 98.0) {
        "IN"
    } else {
        UNKNOWN_COUNTRY
    }
}
