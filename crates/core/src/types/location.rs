//! Location records and the tolerance matcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::coordinates::Coordinates;
use super::id::{LocationId, UserId};

/// A stored place.
///
/// Locations are created lazily the first time weather is requested for
/// unseen coordinates, or explicitly when a user adds a favorite. Anonymous
/// locations (`user_id` of `None`) are shared by everyone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

impl Location {
    /// The stored coordinates.
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates::from_stored(self.lat, self.lon)
    }

    /// Whether `user_id` owns this location.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == Some(user_id)
    }
}

/// Fields for a location that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    pub user_id: Option<UserId>,
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
    pub is_favorite: bool,
}

impl NewLocation {
    /// An anonymous, non-favorite location as created by a weather lookup.
    #[must_use]
    pub fn lookup(
        coordinates: Coordinates,
        name: impl Into<String>,
        country: impl Into<String>,
        user_id: Option<UserId>,
    ) -> Self {
        Self {
            user_id,
            name: name.into(),
            country: country.into(),
            coordinates,
            is_favorite: false,
        }
    }
}

/// Find the stored location that matches `query` within tolerance.
///
/// When several candidates fall inside the tolerance, the one nearest by
/// Euclidean distance in degree space wins, and exact distance ties go to the
/// smallest id. Returns `None` when nothing matches.
pub fn find_nearest<'a, I>(candidates: I, query: Coordinates) -> Option<&'a Location>
where
    I: IntoIterator<Item = &'a Location>,
{
    candidates
        .into_iter()
        .filter(|location| location.coordinates().is_near(query))
        .min_by(|a, b| {
            a.coordinates()
                .distance_squared(query)
                .total_cmp(&b.coordinates().distance_squared(query))
                .then(a.id.cmp(&b.id))
        })
}

/// A favorite kept client-side while no session exists.
///
/// Anonymous favorites have no id: their identity is their position in the
/// stored list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalFavorite {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub country: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn location(id: i32, lat: f64, lon: f64) -> Location {
        Location {
            id: LocationId::new(id),
            user_id: None,
            name: format!("place-{id}"),
            country: "XX".to_owned(),
            lat,
            lon,
            is_favorite: false,
            created_at: Utc::now(),
        }
    }

    fn at(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    #[test]
    fn test_find_nearest_misses_outside_tolerance() {
        let stored = [location(1, 10.0, 10.0)];
        assert!(find_nearest(&stored, at(10.02, 10.0)).is_none());
        let empty: [Location; 0] = [];
        assert!(find_nearest(&empty, at(10.0, 10.0)).is_none());
    }

    #[test]
    fn test_find_nearest_prefers_closest_candidate() {
        let stored = [
            location(1, 10.008, 10.0),
            location(2, 10.001, 10.001),
            location(3, 10.005, 10.005),
        ];
        let found = find_nearest(&stored, at(10.0, 10.0)).unwrap();
        assert_eq!(found.id, LocationId::new(2));
    }

    #[test]
    fn test_find_nearest_breaks_ties_by_smallest_id() {
        // Offsets of 2^-8 keep both distances exactly equal.
        let stored = [
            location(7, 10.503_906_25, 10.5),
            location(4, 10.496_093_75, 10.5),
        ];
        let found = find_nearest(&stored, at(10.5, 10.5)).unwrap();
        assert_eq!(found.id, LocationId::new(4));
    }

    #[test]
    fn test_location_serializes_camel_case() {
        let json = serde_json::to_value(location(5, 1.0, 2.0)).unwrap();
        assert_eq!(json["isFavorite"], false);
        assert_eq!(json["userId"], serde_json::Value::Null);
        assert_eq!(json["lat"], 1.0);
    }

    #[test]
    fn test_local_favorites_round_trip_in_order() {
        let favorites = vec![
            LocalFavorite {
                lat: 37.7749,
                lon: -122.4194,
                name: "San Francisco".to_owned(),
                country: "US".to_owned(),
            },
            LocalFavorite {
                lat: 51.5074,
                lon: -0.1278,
                name: "London".to_owned(),
                country: "GB".to_owned(),
            },
            LocalFavorite {
                lat: 35.6762,
                lon: 139.6503,
                name: "Tokyo".to_owned(),
                country: "JP".to_owned(),
            },
        ];

        let json = serde_json::to_string(&favorites).unwrap();
        let restored: Vec<LocalFavorite> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, favorites);
    }
}
