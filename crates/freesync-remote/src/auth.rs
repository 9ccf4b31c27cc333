//! Request authentication
//!
//! The vault endpoint authenticates with `Authorization: Bearer {username}`.
//! The username is reused as the token value and the password is never sent.
//! The wire behaviour is kept for server compatibility; [`AuthProvider`] is
//! the seam where a real credential exchange would plug in.

use freesync_core::config::RemoteConfig;
use reqwest::RequestBuilder;

/// Attaches credentials to an outgoing vault request
pub trait AuthProvider: Send + Sync {
    /// Returns the request with its authentication applied
    fn authorize(&self, request: RequestBuilder, config: &RemoteConfig) -> RequestBuilder;
}

/// Sends the configured username as a bearer token
///
/// An empty username still produces the header (`Bearer `).
#[derive(Debug, Clone, Copy, Default)]
pub struct UsernameBearer;

impl AuthProvider for UsernameBearer {
    fn authorize(&self, request: RequestBuilder, config: &RemoteConfig) -> RequestBuilder {
        request.bearer_auth(&config.username)
    }
}
