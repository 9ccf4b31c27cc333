//! Vault endpoint HTTP client
//!
//! Wraps `reqwest::Client` with URL construction, authentication and the
//! per-request timeout for `{host}/vault/{vault_id}`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use freesync_core::config::RemoteConfig;
//! use freesync_remote::client::VaultClient;
//! use reqwest::Method;
//!
//! # async fn example() -> Result<(), freesync_remote::RemoteError> {
//! let client = VaultClient::new();
//! let config = RemoteConfig::default();
//! let response = client
//!     .request(Method::GET, &config, "my-notes")?
//!     .send()
//!     .await?;
//! println!("status: {}", response.status());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use freesync_core::config::RemoteConfig;
use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::debug;

use crate::auth::{AuthProvider, UsernameBearer};
use crate::RemoteError;

/// User agent sent with every request
const USER_AGENT: &str = concat!("freesync/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the vault endpoint
///
/// Holds no settings of its own: host, credentials and timeout come from the
/// [`RemoteConfig`] passed to each call.
#[derive(Clone)]
pub struct VaultClient {
    /// The underlying HTTP client
    client: Client,
    /// How requests are authenticated
    auth: Arc<dyn AuthProvider>,
}

impl VaultClient {
    /// Creates a client that authenticates with [`UsernameBearer`]
    pub fn new() -> Self {
        Self::with_auth(Arc::new(UsernameBearer))
    }

    /// Creates a client with a custom authentication provider
    pub fn with_auth(auth: Arc<dyn AuthProvider>) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, auth }
    }

    /// Creates an authenticated request builder for the vault resource
    ///
    /// # Errors
    /// Returns `RemoteError::InvalidUrl` if `config.host` is not a valid URL
    pub fn request(
        &self,
        method: Method,
        config: &RemoteConfig,
        vault_id: &str,
    ) -> Result<RequestBuilder, RemoteError> {
        let url = config.vault_url(vault_id)?;
        debug!(%method, %url, "Building vault request");
        let request = self
            .client
            .request(method, url)
            .timeout(config.timeout());
        Ok(self.auth.authorize(request, config))
    }

    /// Sends a request and rejects any non-2xx response
    ///
    /// The body of an error response is discarded.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status));
        }
        Ok(response)
    }

    /// Returns a reference to the underlying reqwest Client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Default for VaultClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient").finish_non_exhaustive()
    }
}
