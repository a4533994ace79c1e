//! In-memory storage backend.
//!
//! All tables live behind a single `RwLock`, so every trait method is atomic:
//! reads run concurrently and writes are serialized. Ids come from per-table
//! counters that start at 1 and never reuse a value.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use nimbus_core::{
    Coordinates, Email, ForecastDay, ForecastId, Location, LocationId, MAX_FORECAST_DAYS,
    NewLocation, SnapshotId, StoredForecastDay, UserId, WeatherReading, WeatherSnapshot,
    find_nearest,
};

use super::{RepositoryError, Storage};
use crate::models::{NewUser, User};

/// Storage backed by process memory. Data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

#[derive(Debug)]
struct Tables {
    users: BTreeMap<UserId, (User, String)>,
    locations: BTreeMap<LocationId, Location>,
    snapshots: HashMap<LocationId, WeatherSnapshot>,
    forecasts: HashMap<LocationId, Vec<StoredForecastDay>>,
    next_user: i32,
    next_location: i32,
    next_snapshot: i32,
    next_forecast: i32,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            locations: BTreeMap::new(),
            snapshots: HashMap::new(),
            forecasts: HashMap::new(),
            next_user: 1,
            next_location: 1,
            next_snapshot: 1,
            next_forecast: 1,
        }
    }
}

/// Take the current counter value and advance it.
const fn bump(counter: &mut i32) -> i32 {
    let id = *counter;
    *counter += 1;
    id
}

impl Tables {
    fn insert_location(&mut self, new: NewLocation) -> Location {
        let id = LocationId::new(bump(&mut self.next_location));
        let location = Location {
            id,
            user_id: new.user_id,
            name: new.name,
            country: new.country,
            lat: new.coordinates.lat(),
            lon: new.coordinates.lon(),
            is_favorite: new.is_favorite,
            created_at: Utc::now(),
        };
        self.locations.insert(id, location.clone());
        location
    }
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|(u, _)| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        if tables.users.values().any(|(u, _)| u.username == user.username) {
            return Err(RepositoryError::Conflict(
                "username already exists".to_owned(),
            ));
        }

        let id = UserId::new(bump(&mut tables.next_user));
        let created = User {
            id,
            username: user.username,
            email: user.email,
            created_at: Utc::now(),
        };
        tables
            .users
            .insert(id, (created.clone(), user.password_hash));
        Ok(created)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|(user, _)| user.clone()))
    }

    async fn credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|(user, _)| &user.email == email)
            .cloned())
    }

    async fn find_near(&self, query: Coordinates) -> Result<Option<Location>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(find_nearest(tables.locations.values(), query).cloned())
    }

    async fn resolve_or_create(&self, new: NewLocation) -> Result<Location, RepositoryError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = find_nearest(tables.locations.values(), new.coordinates) {
            return Ok(existing.clone());
        }
        Ok(tables.insert_location(new))
    }

    async fn location(&self, id: LocationId) -> Result<Option<Location>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.locations.get(&id).cloned())
    }

    async fn locations_owned_by(&self, owner: UserId) -> Result<Vec<Location>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .locations
            .values()
            .filter(|location| location.is_owned_by(owner))
            .cloned()
            .collect())
    }

    async fn mark_favorite(
        &self,
        id: LocationId,
        owner: UserId,
    ) -> Result<Option<Location>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.locations.get_mut(&id).map(|location| {
            location.is_favorite = true;
            location.user_id = Some(owner);
            location.clone()
        }))
    }

    async fn delete_owned_location(
        &self,
        id: LocationId,
        owner: UserId,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;

        let owned = tables
            .locations
            .get(&id)
            .is_some_and(|location| location.is_owned_by(owner));
        if !owned {
            return Ok(false);
        }

        tables.locations.remove(&id);
        tables.snapshots.remove(&id);
        tables.forecasts.remove(&id);
        Ok(true)
    }

    async fn record_snapshot(
        &self,
        location_id: LocationId,
        reading: WeatherReading,
    ) -> Result<WeatherSnapshot, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.locations.contains_key(&location_id) {
            return Err(RepositoryError::NotFound);
        }

        let snapshot = WeatherSnapshot {
            id: SnapshotId::new(bump(&mut tables.next_snapshot)),
            location_id,
            reading,
            timestamp: Utc::now(),
        };
        tables.snapshots.insert(location_id, snapshot.clone());
        Ok(snapshot)
    }

    async fn latest_snapshot(
        &self,
        location_id: LocationId,
    ) -> Result<Option<WeatherSnapshot>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.snapshots.get(&location_id).cloned())
    }

    async fn replace_forecast(
        &self,
        location_id: LocationId,
        days: Vec<ForecastDay>,
    ) -> Result<Vec<StoredForecastDay>, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.locations.contains_key(&location_id) {
            return Err(RepositoryError::NotFound);
        }

        let stored: Vec<StoredForecastDay> = days
            .into_iter()
            .take(MAX_FORECAST_DAYS)
            .map(|day| StoredForecastDay {
                id: ForecastId::new(bump(&mut tables.next_forecast)),
                location_id,
                day,
            })
            .collect();

        // Swapping the whole entry under the write lock means readers see
        // either the old set or the new one.
        tables.forecasts.insert(location_id, stored.clone());
        Ok(stored)
    }

    async fn forecast(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<StoredForecastDay>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut days = tables
            .forecasts
            .get(&location_id)
            .cloned()
            .unwrap_or_default();
        days.sort_by_key(|stored| stored.day.date);
        Ok(days)
    }
}
