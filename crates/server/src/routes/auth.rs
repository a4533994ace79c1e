//! Authentication route handlers.
//!
//! Registration and login both leave the caller signed in. The session holds
//! only the user id.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tower_sessions::Session;
use tracing::instrument;

use nimbus_core::api::{AuthResponse, LoginRequest, MessageResponse, RegisterRequest};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Put `user` in the session and the Sentry scope.
async fn sign_in(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, CurrentUser { id: user.id })
        .await
        .map_err(|e| AppError::Internal(format!("failed to set session: {e}")))?;
    set_sentry_user(&user.id, Some(user.username.as_str()));
    Ok(())
}

/// `POST /api/auth/register`
///
/// # Errors
///
/// 400 for malformed input or an email/username that is already taken.
#[instrument(skip(state, session, payload))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(form) = payload.map_err(|_| AppError::BadRequest("Invalid user data".to_owned()))?;

    let user = AuthService::new(state.storage())
        .register(&form.username, &form.email, &form.password)
        .await
        .inspect_err(|e| tracing::warn!("Registration failed: {}", e))?;

    sign_in(&session, &user).await?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok(Json(AuthResponse {
        user: user.summary(),
    }))
}

/// `POST /api/auth/login`
///
/// # Errors
///
/// 401 `Invalid credentials` for an unknown email or a wrong password.
#[instrument(skip(state, session, payload))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(form) = payload.map_err(|_| AppError::Auth(AuthError::InvalidCredentials))?;

    let user = AuthService::new(state.storage())
        .login(&form.email, &form.password)
        .await
        .inspect_err(|e| tracing::warn!("Login failed: {}", e))?;

    sign_in(&session, &user).await?;

    Ok(Json(AuthResponse {
        user: user.summary(),
    }))
}

/// `POST /api/auth/logout`
///
/// # Errors
///
/// 500 if the session store cannot be updated.
pub async fn logout(session: Session) -> Result<Json<MessageResponse>> {
    clear_current_user(&session).await.map_err(|e| {
        tracing::error!("Failed to flush session: {}", e);
        AppError::Internal(format!("failed to flush session: {e}"))
    })?;
    clear_sentry_user();

    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// `GET /api/auth/me`
///
/// # Errors
///
/// 401 without a session; 404 if the session's user no longer exists.
#[instrument(skip(state, auth))]
pub async fn me(State(state): State<AppState>, auth: OptionalAuth) -> Result<Json<AuthResponse>> {
    let user_id = auth
        .user_id()
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_owned()))?;

    let user = AuthService::new(state.storage()).get_user(user_id).await?;

    Ok(Json(AuthResponse {
        user: user.summary(),
    }))
}
