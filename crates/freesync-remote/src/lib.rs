//! FreeSync Remote - HTTP transport for the vault endpoint
//!
//! Provides the adapter behind the `IRemoteTransport` port:
//! - Authenticated `POST`/`GET` against `{host}/vault/{vault_id}`
//! - Streaming download bodies
//!
//! ## Modules
//!
//! - [`auth`] - how requests are authenticated
//! - [`client`] - reqwest wrapper that builds authenticated vault requests
//! - [`transport`] - `IRemoteTransport` implementation

pub mod auth;
pub mod client;
pub mod transport;

use freesync_core::SyncError;
use thiserror::Error;

pub use auth::{AuthProvider, UsernameBearer};
pub use client::VaultClient;
pub use transport::HttpTransport;

/// Errors that can occur when talking to the remote vault endpoint
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The configured host does not form a valid vault URL
    #[error("Invalid vault URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(reqwest::Error),

    /// A network-level error occurred
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout(err)
        } else if let Some(status) = err.status() {
            RemoteError::Status(status)
        } else {
            RemoteError::Network(err)
        }
    }
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Status(status) => SyncError::Remote {
                status_code: status.as_u16(),
            },
            other => SyncError::Network(other.to_string()),
        }
    }
}
