//! Favorites management.
//!
//! With `--email/--password` the account favorites on the server are used;
//! otherwise favorites live in the local storage file.

use nimbus_client::{ApiClient, ClientError, FavoriteHandle};
use nimbus_core::{LocalFavorite, LocationId};

use super::{CommandResult, Credentials, emit, favorites_backend, render};

/// Print all favorites.
///
/// # Errors
///
/// Returns an error if the backend cannot be read.
pub async fn list(api: &ApiClient, credentials: &Credentials) -> CommandResult {
    let (backend, _) = favorites_backend(api, credentials).await?;
    let views = backend.list().await?;
    emit(&render::favorites(&views, backend.kind()));
    Ok(())
}

/// Add a place to the favorites.
///
/// # Errors
///
/// Returns an error for invalid coordinates or if the backend write fails.
pub async fn add(
    api: &ApiClient,
    credentials: &Credentials,
    favorite: LocalFavorite,
) -> CommandResult {
    let (backend, _) = favorites_backend(api, credentials).await?;
    let view = backend.add(favorite).await?;
    emit(&format!(
        "Added [{}] {}, {} to {} favorites",
        view.handle,
        view.name,
        view.country,
        backend.kind()
    ));
    Ok(())
}

/// Remove the favorite shown as `[id]` (account) or `[#id]` (local).
///
/// # Errors
///
/// Returns an error if the backend write fails.
pub async fn remove(api: &ApiClient, credentials: &Credentials, id: u32) -> CommandResult {
    let (backend, authenticated) = favorites_backend(api, credentials).await?;
    let handle = handle_for(authenticated, id)?;
    if backend.remove(handle).await? {
        emit("Location removed from favorites");
    } else {
        emit(&format!("No favorite [{handle}]"));
    }
    Ok(())
}

fn handle_for(authenticated: bool, id: u32) -> Result<FavoriteHandle, ClientError> {
    if authenticated {
        let id = i32::try_from(id)
            .map_err(|_| ClientError::Validation(format!("location id {id} out of range")))?;
        Ok(FavoriteHandle::Remote(LocationId::new(id)))
    } else {
        let index = usize::try_from(id)
            .map_err(|_| ClientError::Validation(format!("index {id} out of range")))?;
        Ok(FavoriteHandle::Local(index))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_follows_auth_state() {
        assert_eq!(
            handle_for(true, 12).unwrap(),
            FavoriteHandle::Remote(LocationId::new(12))
        );
        assert_eq!(handle_for(false, 2).unwrap(), FavoriteHandle::Local(2));
        assert!(handle_for(true, u32::MAX).is_err());
    }
}
