//! Remote transport port (driven/secondary port)
//!
//! The Transport Client: one authenticated POST to push a multipart body and
//! one authenticated GET to pull one, both against `{host}/vault/{vault_id}`.
//!
//! ## Design Notes
//!
//! - The config is passed on every call; implementations must not cache it.
//! - Neither operation retries. A failed request is reported once and the
//!   next scheduled pass is the retry.
//! - Download bodies are returned as a chunk stream so callers can decode
//!   incrementally.

use futures_util::stream::{self, BoxStream};

use crate::config::RemoteConfig;
use crate::domain::SyncError;

/// Stream of body chunks as they arrive from the network
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>, SyncError>>;

/// A downloaded response body
pub struct RemoteBody {
    /// The response `Content-Type` header value
    pub content_type: String,
    /// The body, chunk by chunk
    pub chunks: ChunkStream,
}

impl RemoteBody {
    /// Wraps a body that is already fully in memory
    pub fn from_bytes(content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            chunks: Box::pin(stream::once(async move { Ok(body) })),
        }
    }
}

impl std::fmt::Debug for RemoteBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBody")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Port trait for the remote vault endpoint
#[async_trait::async_trait]
pub trait IRemoteTransport: Send + Sync {
    /// Sends an encoded multipart body with `POST {host}/vault/{vault_id}`
    ///
    /// # Errors
    /// - `SyncError::Network` on connection failure or timeout
    /// - `SyncError::Remote` on a non-2xx status
    async fn upload(
        &self,
        config: &RemoteConfig,
        vault_id: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), SyncError>;

    /// Fetches the remote vault with `GET {host}/vault/{vault_id}`
    ///
    /// # Errors
    /// - `SyncError::Network` on connection failure or timeout
    /// - `SyncError::Remote` on a non-2xx status
    async fn download(&self, config: &RemoteConfig, vault_id: &str)
        -> Result<RemoteBody, SyncError>;
}
