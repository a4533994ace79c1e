//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error body is `{"message": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use nimbus_core::api::MessageResponse;

use crate::db::RepositoryError;
use crate::services::{AuthError, LocationError, WeatherError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storage operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Location or favorite operation failed.
    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    /// Weather lookup failed. The message is what the client sees.
    #[error("{message}: {source}")]
    Weather {
        message: &'static str,
        #[source]
        source: WeatherError,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap a weather failure with the message shown to clients.
    #[must_use]
    pub const fn weather(message: &'static str, source: WeatherError) -> Self {
        Self::Weather { message, source }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Weather { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::UserAlreadyExists
                | AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidUsername(_) => StatusCode::BAD_REQUEST,
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Location(err) => match err {
                LocationError::Coordinates(_) | LocationError::EmptyQuery => {
                    StatusCode::BAD_REQUEST
                }
                LocationError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn client_message(&self) -> String {
        // Don't expose internal error details to clients
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_owned(),
            Self::Weather { message, .. } => (*message).to_owned(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_owned(),
                AuthError::UserNotFound => "User not found".to_owned(),
                AuthError::UserAlreadyExists => "User already exists".to_owned(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) | AuthError::InvalidUsername(_) => {
                    format!("Invalid user data: {err}")
                }
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    "Internal server error".to_owned()
                }
            },
            Self::Location(err) => match err {
                LocationError::Coordinates(e) => format!("Invalid coordinates: {e}"),
                LocationError::EmptyQuery => "Query parameter required".to_owned(),
                LocationError::Repository(_) => "Internal server error".to_owned(),
            },
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(MessageResponse::new(self.client_message()))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
