//! Search and favorites handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::PathRejection},
};
use serde::Deserialize;
use tracing::instrument;

use nimbus_core::api::{AddFavoriteRequest, CityMatch, FavoriteEntry, MessageResponse};
use nimbus_core::{Location, LocationId};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::LocationService;
use crate::state::AppState;

/// Query for `GET /api/locations/search`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// `GET /api/locations/search?q=`
///
/// # Errors
///
/// 400 `Query parameter required` when `q` is missing or blank.
pub async fn search(Query(query): Query<SearchQuery>) -> Result<Json<Vec<CityMatch>>> {
    let q = query.q.unwrap_or_default();
    Ok(Json(LocationService::search(&q)?))
}

/// `GET /api/locations/favorites`
///
/// # Errors
///
/// 401 without a session.
#[instrument(skip(state, auth), fields(user_id = %auth.user_id()))]
pub async fn list_favorites(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<FavoriteEntry>>> {
    let favorites = LocationService::new(state.storage())
        .list_favorites(auth.user_id())
        .await?;
    Ok(Json(favorites))
}

/// `POST /api/locations/favorites`
///
/// # Errors
///
/// 401 without a session; 400 for a malformed body or bad coordinates.
#[instrument(skip(state, auth, payload), fields(user_id = %auth.user_id()))]
pub async fn add_favorite(
    State(state): State<AppState>,
    auth: RequireAuth,
    payload: std::result::Result<Json<AddFavoriteRequest>, JsonRejection>,
) -> Result<Json<Location>> {
    let Json(request) =
        payload.map_err(|_| AppError::BadRequest("Invalid location data".to_owned()))?;

    let location = LocationService::new(state.storage())
        .add_favorite(auth.user_id(), request)
        .await?;
    Ok(Json(location))
}

/// `DELETE /api/locations/favorites/{id}`
///
/// # Errors
///
/// 401 without a session; 404 when the location is unknown or owned by
/// someone else.
#[instrument(skip(state, auth, id), fields(user_id = %auth.user_id()))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    auth: RequireAuth,
    id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageResponse>> {
    let Path(id) = id.map_err(|_| AppError::BadRequest("Invalid location id".to_owned()))?;

    let removed = LocationService::new(state.storage())
        .remove_favorite(auth.user_id(), LocationId::new(id))
        .await?;

    if removed {
        Ok(Json(MessageResponse::new("Favorite removed")))
    } else {
        Err(AppError::NotFound("Location not found".to_owned()))
    }
}
