//! CLI command implementations.

pub mod dashboard;
pub mod favorites;
pub mod migrate;
pub mod render;
pub mod search;

use clap::Args;
use tracing::{info, warn};

use nimbus_client::{ApiClient, FavoritesBackend, LocalStorage, select_backend};

/// Boxed error used by every command.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Optional account sign-in shared by commands that touch favorites.
#[derive(Debug, Clone, Args)]
pub struct Credentials {
    /// Account email; favorites are stored locally when omitted
    #[arg(long, env = "NIMBUS_EMAIL", requires = "password")]
    pub email: Option<String>,

    /// Account password
    #[arg(long, env = "NIMBUS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Write command output to stdout.
#[allow(clippy::print_stdout)]
pub fn emit(text: &str) {
    println!("{text}");
}

/// Log in when credentials are given, then ask the server who we are.
///
/// Any failure leaves the client anonymous.
pub async fn sign_in(api: &ApiClient, credentials: &Credentials) -> bool {
    let (Some(email), Some(password)) = (&credentials.email, &credentials.password) else {
        return false;
    };

    if let Err(e) = api.login(email, password).await {
        warn!(error = %e, "Login failed, continuing without an account");
        return false;
    }

    match api.me().await {
        Ok(Some(user)) => {
            info!(username = %user.username, "Signed in");
            true
        }
        Ok(None) => false,
        Err(e) => {
            warn!(error = %e, "Could not confirm session");
            false
        }
    }
}

/// Sign in if possible and return the matching favorites backend.
///
/// # Errors
///
/// Returns an error if the local storage location cannot be determined.
pub async fn favorites_backend(
    api: &ApiClient,
    credentials: &Credentials,
) -> Result<(Box<dyn FavoritesBackend>, bool), Box<dyn std::error::Error>> {
    let authenticated = sign_in(api, credentials).await;
    let storage = LocalStorage::open_default()?;
    if !authenticated {
        info!(path = %storage.path().display(), "Using local favorites");
    }
    Ok((select_backend(authenticated, api.clone(), storage), authenticated))
}
