//! Client configuration.
//!
//! # Environment Variables
//!
//! - `NIMBUS_API_URL` - Base URL of the Nimbus server (default:
//!   <http://localhost:3000>)

use std::time::Duration;

use url::Url;

use crate::error::ClientError;

/// Default server URL when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Request timeout applied to every call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root. Always ends with `/` so relative joins keep any path
    /// prefix.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Build a config for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the URL cannot be parsed or is
    /// not http(s).
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut url = Url::parse(base_url)
            .map_err(|e| ClientError::Validation(format!("invalid API URL `{base_url}`: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Validation(format!(
                "API URL must be http or https, got `{}`",
                url.scheme()
            )));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            base_url: url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Load from `NIMBUS_API_URL`, falling back to [`DEFAULT_API_URL`].
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the configured URL is invalid.
    pub fn from_env() -> Result<Self, ClientError> {
        let url = std::env::var("NIMBUS_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::new(&url)
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
