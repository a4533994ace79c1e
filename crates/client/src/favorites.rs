//! Favorites, wherever they live.
//!
//! A signed-in user's favorites are server-side locations; an anonymous
//! user's favorites are a JSON array in [`LocalStorage`]. Both sit behind
//! [`FavoritesBackend`] so callers pick one from the auth state and never
//! branch again.

use async_trait::async_trait;
use tracing::{debug, instrument};

use nimbus_core::api::{AddFavoriteRequest, FavoriteEntry};
use nimbus_core::{Coordinates, LocalFavorite, LocationId, WeatherSnapshot};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::storage::LocalStorage;

/// Key of the anonymous favorites array in local storage.
pub const LOCAL_FAVORITES_KEY: &str = "weatherFavorites";

/// Identifies a favorite within its backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteHandle {
    /// Server location id.
    Remote(LocationId),
    /// Position in the local array.
    Local(usize),
}

impl std::fmt::Display for FavoriteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(id) => write!(f, "{id}"),
            Self::Local(index) => write!(f, "#{index}"),
        }
    }
}

/// A favorite as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteView {
    pub handle: FavoriteHandle,
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    /// Latest stored reading. Always `None` for local favorites.
    pub weather: Option<WeatherSnapshot>,
}

impl From<FavoriteEntry> for FavoriteView {
    fn from(entry: FavoriteEntry) -> Self {
        Self {
            handle: FavoriteHandle::Remote(entry.location.id),
            name: entry.location.name,
            country: entry.location.country,
            lat: entry.location.lat,
            lon: entry.location.lon,
            weather: entry.weather,
        }
    }
}

/// Storage for a user's favorite places.
#[async_trait]
pub trait FavoritesBackend: Send + Sync {
    /// Short label for messages ("account" or "local").
    fn kind(&self) -> &'static str;

    /// All favorites in display order.
    async fn list(&self) -> Result<Vec<FavoriteView>, ClientError>;

    /// Add a place and return the stored favorite.
    async fn add(&self, favorite: LocalFavorite) -> Result<FavoriteView, ClientError>;

    /// Remove a favorite. Returns `false` if nothing matched the handle.
    ///
    /// A handle from the other backend is a `ClientError::Validation`.
    async fn remove(&self, handle: FavoriteHandle) -> Result<bool, ClientError>;
}

/// Favorites stored on the server for the signed-in user.
#[derive(Debug, Clone)]
pub struct RemoteFavorites {
    api: ApiClient,
}

impl RemoteFavorites {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl FavoritesBackend for RemoteFavorites {
    fn kind(&self) -> &'static str {
        "account"
    }

    async fn list(&self) -> Result<Vec<FavoriteView>, ClientError> {
        let entries = self.api.favorites().await?;
        Ok(entries.into_iter().map(FavoriteView::from).collect())
    }

    #[instrument(skip(self, favorite), fields(name = %favorite.name))]
    async fn add(&self, favorite: LocalFavorite) -> Result<FavoriteView, ClientError> {
        let request = AddFavoriteRequest {
            lat: favorite.lat,
            lon: favorite.lon,
            name: favorite.name,
            country: favorite.country,
        };
        let location = self.api.add_favorite(&request).await?;
        Ok(FavoriteView {
            handle: FavoriteHandle::Remote(location.id),
            name: location.name,
            country: location.country,
            lat: location.lat,
            lon: location.lon,
            weather: None,
        })
    }

    #[instrument(skip(self))]
    async fn remove(&self, handle: FavoriteHandle) -> Result<bool, ClientError> {
        let FavoriteHandle::Remote(id) = handle else {
            return Err(ClientError::Validation(format!(
                "{handle} is a local favorite, not an account favorite"
            )));
        };
        match self.api.remove_favorite(id).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Favorites kept on this machine while signed out.
#[derive(Debug)]
pub struct LocalFavorites {
    storage: LocalStorage,
}

impl LocalFavorites {
    #[must_use]
    pub const fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    async fn read(&self) -> Result<Vec<LocalFavorite>, ClientError> {
        self.storage
            .get_item(LOCAL_FAVORITES_KEY)
            .await?
            .map_or_else(|| Ok(Vec::new()), |json| parse_favorites(&json))
    }

    /// Apply `f` to the stored list and write the result back atomically.
    async fn modify<T, F>(&self, f: F) -> Result<T, ClientError>
    where
        F: FnOnce(&mut Vec<LocalFavorite>) -> T + Send,
        T: Send,
    {
        self.storage
            .update(LOCAL_FAVORITES_KEY, |current| {
                let mut favorites = match current {
                    Some(json) => parse_favorites(&json)?,
                    None => Vec::new(),
                };
                let out = f(&mut favorites);
                Ok((Some(serde_json::to_string(&favorites)?), out))
            })
            .await
    }
}

fn parse_favorites(json: &str) -> Result<Vec<LocalFavorite>, ClientError> {
    Ok(serde_json::from_str(json)?)
}

fn local_view(index: usize, favorite: LocalFavorite) -> FavoriteView {
    FavoriteView {
        handle: FavoriteHandle::Local(index),
        name: favorite.name,
        country: favorite.country,
        lat: favorite.lat,
        lon: favorite.lon,
        weather: None,
    }
}

#[async_trait]
impl FavoritesBackend for LocalFavorites {
    fn kind(&self) -> &'static str {
        "local"
    }

    async fn list(&self) -> Result<Vec<FavoriteView>, ClientError> {
        let favorites = self.read().await?;
        Ok(favorites
            .into_iter()
            .enumerate()
            .map(|(i, f)| local_view(i, f))
            .collect())
    }

    async fn add(&self, favorite: LocalFavorite) -> Result<FavoriteView, ClientError> {
        Coordinates::new(favorite.lat, favorite.lon)
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        // Same place twice is kept twice, as in the browser client.
        let entry = favorite.clone();
        let index = self
            .modify(move |favorites| {
                favorites.push(entry);
                favorites.len() - 1
            })
            .await?;
        debug!(index, name = %favorite.name, "Local favorite added");
        Ok(local_view(index, favorite))
    }

    async fn remove(&self, handle: FavoriteHandle) -> Result<bool, ClientError> {
        let FavoriteHandle::Local(index) = handle else {
            return Err(ClientError::Validation(format!(
                "{handle} is an account favorite, not a local favorite"
            )));
        };
        self.modify(move |favorites| {
            if index < favorites.len() {
                favorites.remove(index);
                true
            } else {
                false
            }
        })
        .await
    }
}

/// Pick the backend for the current auth state.
#[must_use]
pub fn select_backend(
    authenticated: bool,
    api: ApiClient,
    storage: LocalStorage,
) -> Box<dyn FavoritesBackend> {
    if authenticated {
        Box::new(RemoteFavorites::new(api))
    } else {
        Box::new(LocalFavorites::new(storage))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn favorite(name: &str, lat: f64, lon: f64) -> LocalFavorite {
        LocalFavorite {
            lat,
            lon,
            name: name.to_string(),
            country: "US".to_string(),
        }
    }

    fn local(dir: &tempfile::TempDir) -> LocalFavorites {
        LocalFavorites::new(LocalStorage::new(dir.path().join("store.json")))
    }

    #[tokio::test]
    async fn test_local_round_trip_preserves_entries() {
        let dir = tempfile::tempdir().unwrap();
        let backend = local(&dir);

        let added = vec![
            favorite("San Francisco", 37.7749, -122.4194),
            favorite("New York", 40.7128, -74.006),
            favorite("Seattle", 47.6062, -122.3321),
        ];
        for f in &added {
            backend.add(f.clone()).await.unwrap();
        }

        // Re-read through a new backend over the same file.
        let listed = local(&dir).list().await.unwrap();
        assert_eq!(listed.len(), 3);
        for (i, (view, original)) in listed.iter().zip(&added).enumerate() {
            assert_eq!(view.handle, FavoriteHandle::Local(i));
            assert_eq!(view.name, original.name);
            assert_eq!(view.country, original.country);
            assert!((view.lat - original.lat).abs() < f64::EPSILON);
            assert!((view.lon - original.lon).abs() < f64::EPSILON);
            assert!(view.weather.is_none());
        }
    }

    #[tokio::test]
    async fn test_local_uses_well_known_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("store.json"));
        let backend = LocalFavorites::new(storage);
        backend
            .add(favorite("Chicago", 41.8781, -87.6298))
            .await
            .unwrap();

        let raw = LocalStorage::new(dir.path().join("store.json"))
            .get_item(LOCAL_FAVORITES_KEY)
            .await
            .unwrap()
            .unwrap();
        let parsed: Vec<LocalFavorite> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, vec![favorite("Chicago", 41.8781, -87.6298)]);
    }

    #[tokio::test]
    async fn test_local_add_keeps_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let backend = local(&dir);
        backend.add(favorite("Paris", 48.8566, 2.3522)).await.unwrap();
        let second = backend.add(favorite("Paris", 48.8566, 2.3522)).await.unwrap();

        assert_eq!(second.handle, FavoriteHandle::Local(1));
        assert_eq!(backend.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_local_add_rejects_bad_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let backend = local(&dir);
        let err = backend.add(favorite("Nowhere", 95.0, 0.0)).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(backend.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_remove_by_index() {
        let dir = tempfile::tempdir().unwrap();
        let backend = local(&dir);
        backend.add(favorite("A", 1.0, 1.0)).await.unwrap();
        backend.add(favorite("B", 2.0, 2.0)).await.unwrap();
        backend.add(favorite("C", 3.0, 3.0)).await.unwrap();

        assert!(backend.remove(FavoriteHandle::Local(1)).await.unwrap());
        assert!(!backend.remove(FavoriteHandle::Local(5)).await.unwrap());

        let names: Vec<_> = backend
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, ["A", "C"]);
    }

    #[tokio::test]
    async fn test_wrong_handle_kind_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let backend = local(&dir);
        let err = backend
            .remove(FavoriteHandle::Remote(LocationId::new(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        let api = ApiClient::new(&ClientConfig::new("http://127.0.0.1:9").unwrap()).unwrap();
        let remote = RemoteFavorites::new(api);
        let err = remote.remove(FavoriteHandle::Local(0)).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_concurrent_local_adds_keep_every_entry() {
        let dir = tempfile::tempdir().unwrap();
        let backend = std::sync::Arc::new(local(&dir));

        let handles: Vec<_> = (0..20_i32)
            .map(|i| {
                let backend = std::sync::Arc::clone(&backend);
                tokio::spawn(async move {
                    backend
                        .add(favorite(&format!("Place {i}"), f64::from(i), 0.0))
                        .await
                })
            })
            .collect();

        let mut indices = Vec::new();
        for handle in handles {
            let view = handle.await.unwrap().unwrap();
            let FavoriteHandle::Local(index) = view.handle else {
                panic!("expected a local handle");
            };
            indices.push(index);
        }
        indices.sort_unstable();
        assert_eq!(indices, (0..20).collect::<Vec<_>>());
        assert_eq!(local(&dir).list().await.unwrap().len(), 20);
    }

    #[test]
    fn test_select_backend() {
        let dir = tempfile::tempdir().unwrap();
        let api = ApiClient::new(&ClientConfig::new("http://localhost:3000").unwrap()).unwrap();

        let backend = select_backend(true, api.clone(), LocalStorage::new(dir.path().join("a")));
        assert_eq!(backend.kind(), "account");

        let backend = select_backend(false, api, LocalStorage::new(dir.path().join("b")));
        assert_eq!(backend.kind(), "local");
    }
}
