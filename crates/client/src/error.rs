//! Error types for the Nimbus client.

use nimbus_core::api::MessageResponse;
use thiserror::Error;

/// Errors that can occur when talking to the server or local storage.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connection, timeout, or undecodable body).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// `message` field of the error body.
        message: String,
    },

    /// Local storage file could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Local storage contents are not valid JSON.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Input rejected before any request was made.
    #[error("validation error: {0}")]
    Validation(String),
}

impl ClientError {
    /// Build an `Api` error from a status and the raw response body.
    ///
    /// Falls back to the canonical reason phrase when the body is not a
    /// `{"message": ...}` object.
    #[must_use]
    pub fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<MessageResponse>(body).map_or_else(
            |_| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            },
            |m| m.message,
        );
        Self::Api {
            status: status.as_u16(),
            message,
        }
    }

    /// HTTP status of an `Api` error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server reported a missing resource.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// Whether the server rejected the call for lack of a session.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }
}
