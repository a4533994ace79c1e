//! Location matching and per-user favorites.

use thiserror::Error;
use tracing::instrument;

use nimbus_core::api::{AddFavoriteRequest, CityMatch, FavoriteEntry};
use nimbus_core::{CoordinateError, Coordinates, Location, LocationId, NewLocation, UserId};

use super::gazetteer;
use crate::db::{RepositoryError, Storage};

/// Errors from location operations.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error(transparent)]
    Coordinates(#[from] CoordinateError),

    #[error("search query is empty")]
    EmptyQuery,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Location and favorite operations against one storage backend.
pub struct LocationService<'a> {
    storage: &'a dyn Storage,
}

impl<'a> LocationService<'a> {
    #[must_use]
    pub const fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    /// Search the built-in city list.
    ///
    /// # Errors
    ///
    /// Returns `LocationError::EmptyQuery` for a blank query.
    pub fn search(query: &str) -> Result<Vec<CityMatch>, LocationError> {
        if query.trim().is_empty() {
            return Err(LocationError::EmptyQuery);
        }
        Ok(gazetteer::search(query))
    }

    /// Favorites owned by `owner`, each with its live snapshot, in id order.
    ///
    /// # Errors
    ///
    /// Returns `LocationError::Repository` if storage fails.
    #[instrument(skip(self))]
    pub async fn list_favorites(&self, owner: UserId) -> Result<Vec<FavoriteEntry>, LocationError> {
        let locations = self.storage.locations_owned_by(owner).await?;

        let mut entries = Vec::new();
        for location in locations.into_iter().filter(|l| l.is_favorite) {
            let weather = self.storage.latest_snapshot(location.id).await?;
            entries.push(FavoriteEntry { location, weather });
        }
        Ok(entries)
    }

    /// Mark the place at the requested coordinates as a favorite of `owner`.
    ///
    /// A new location takes the supplied name and country; a matched one keeps
    /// its own and is handed to `owner`. Calling this twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns `LocationError::Coordinates` for out-of-range coordinates.
    #[instrument(skip(self, request), fields(lat = request.lat, lon = request.lon))]
    pub async fn add_favorite(
        &self,
        owner: UserId,
        request: AddFavoriteRequest,
    ) -> Result<Location, LocationError> {
        let coordinates = Coordinates::new(request.lat, request.lon)?;

        let location = self
            .storage
            .resolve_or_create(NewLocation {
                user_id: Some(owner),
                name: request.name,
                country: request.country,
                coordinates,
                is_favorite: true,
            })
            .await?;

        if location.is_favorite && location.is_owned_by(owner) {
            return Ok(location);
        }

        // The location may have been deleted between the two calls.
        self.storage
            .mark_favorite(location.id, owner)
            .await?
            .ok_or(LocationError::Repository(RepositoryError::NotFound))
    }

    /// Delete a favorite owned by `owner`.
    ///
    /// Returns `false` when the id is unknown or belongs to someone else.
    ///
    /// # Errors
    ///
    /// Returns `LocationError::Repository` if storage fails.
    #[instrument(skip(self))]
    pub async fn remove_favorite(
        &self,
        owner: UserId,
        id: LocationId,
    ) -> Result<bool, LocationError> {
        Ok(self.storage.delete_owned_location(id, owner).await?)
    }
}
