//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use nimbus_core::api::UserSummary;
use nimbus_core::{Email, UserId, Username};

/// A registered user (domain type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique public handle.
    pub username: Username,
    /// Unique login email.
    pub email: Email,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The client-facing view of this user.
    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
        }
    }
}

/// Fields for a user that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub email: Email,
    /// Argon2id PHC string. Never the plaintext password.
    pub password_hash: String,
}
