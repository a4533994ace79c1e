//! Authentication service.
//!
//! Password registration and login. Session handling lives in the
//! middleware; this module only decides who the caller is.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use nimbus_core::{Email, UserId, Username};

use crate::db::{RepositoryError, Storage};
use crate::models::{NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    storage: &'a dyn Storage,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::InvalidUsername` if a
    /// field is malformed.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email or username is taken.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username)?;
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .storage
            .create_user(NewUser {
                username,
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong,
    /// including when the email is not even well formed.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .storage
            .credentials_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.storage
            .user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStorage;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("battery staple", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("eightchr").is_ok());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let storage = MemoryStorage::new();
        let auth = AuthService::new(&storage);

        let user = auth
            .register("grace", "grace@example.com", "hopper1906")
            .await
            .unwrap();
        assert_eq!(user.username.as_str(), "grace");

        let logged_in = auth.login("grace@example.com", "hopper1906").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(auth.get_user(user.id).await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let storage = MemoryStorage::new();
        let auth = AuthService::new(&storage);
        auth.register("grace", "grace@example.com", "hopper1906")
            .await
            .unwrap();

        assert!(matches!(
            auth.register("other", "grace@example.com", "hopper1906")
                .await,
            Err(AuthError::UserAlreadyExists)
        ));
        assert!(matches!(
            auth.register("grace", "g2@example.com", "hopper1906").await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_register_validates_fields() {
        let storage = MemoryStorage::new();
        let auth = AuthService::new(&storage);

        assert!(matches!(
            auth.register("ab", "a@example.com", "longenough").await,
            Err(AuthError::InvalidUsername(_))
        ));
        assert!(matches!(
            auth.register("abc", "not-an-email", "longenough").await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            auth.register("abc", "a@example.com", "short").await,
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() {
        let storage = MemoryStorage::new();
        let auth = AuthService::new(&storage);
        auth.register("grace", "grace@example.com", "hopper1906")
            .await
            .unwrap();

        for (email, password) in [
            ("grace@example.com", "wrong-password"),
            ("nobody@example.com", "hopper1906"),
            ("garbage", "hopper1906"),
        ] {
            assert!(matches!(
                auth.login(email, password).await,
                Err(AuthError::InvalidCredentials)
            ));
        }
    }
}
