//! Authentication extractors.
//!
//! The session holds only a [`CurrentUser`]; these extractors read it so
//! handlers never touch session keys directly.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use nimbus_core::UserId;
use nimbus_core::api::MessageResponse;

use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a signed-in user.
///
/// Rejects with `401 {"message": "Authentication required"}` otherwise.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, user {}!", user.id)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl RequireAuth {
    /// The acting principal.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.0.id
    }
}

/// Rejection for [`RequireAuth`].
#[derive(Debug)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(MessageResponse::new("Authentication required")),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state)
            .await
            .unwrap_or(OptionalAuth(None));
        user.map(Self).ok_or(AuthRejection)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl OptionalAuth {
    /// The acting principal, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.0.map(|user| user.id)
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the signed-in user in the session.
///
/// The session id is rotated first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// End the session entirely (logout).
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
