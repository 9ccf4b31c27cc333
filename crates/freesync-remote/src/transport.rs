//! HttpTransport - IRemoteTransport implementation over HTTP
//!
//! Uploads are a single `POST` carrying the encoded multipart body. Downloads
//! are a `GET` whose body is handed back as a chunk stream so the engine can
//! decode while bytes arrive.
//!
//! ## Design Notes
//!
//! - No retries. A failed request surfaces once as `Network` or `Remote`.
//! - Read errors in the middle of a download stream are reported as
//!   `Network` on the chunk that failed.

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use tracing::{debug, info};

use freesync_core::config::RemoteConfig;
use freesync_core::ports::{IRemoteTransport, RemoteBody};
use freesync_core::SyncError;

use crate::client::VaultClient;
use crate::RemoteError;

/// Remote transport backed by [`VaultClient`]
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: VaultClient,
}

impl HttpTransport {
    /// Creates a transport with the default username bearer authentication
    pub fn new() -> Self {
        Self {
            client: VaultClient::new(),
        }
    }

    /// Creates a transport around an existing client
    pub fn with_client(client: VaultClient) -> Self {
        Self { client }
    }

    /// Returns the underlying vault client
    pub fn client(&self) -> &VaultClient {
        &self.client
    }
}

#[async_trait]
impl IRemoteTransport for HttpTransport {
    #[tracing::instrument(skip(self, config, body), fields(host = %config.host, bytes = body.len()))]
    async fn upload(
        &self,
        config: &RemoteConfig,
        vault_id: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), SyncError> {
        let request = self
            .client
            .request(Method::POST, config, vault_id)?
            .header(CONTENT_TYPE, content_type)
            .body(body);

        let response = self.client.send(request).await?;
        info!(status = %response.status(), "Upload accepted");
        Ok(())
    }

    #[tracing::instrument(skip(self, config), fields(host = %config.host))]
    async fn download(
        &self,
        config: &RemoteConfig,
        vault_id: &str,
    ) -> Result<RemoteBody, SyncError> {
        let request = self.client.request(Method::GET, config, vault_id)?;
        let response = self.client.send(request).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        debug!(
            status = %response.status(),
            content_type = %content_type,
            content_length = ?response.content_length(),
            "Download response received"
        );

        let chunks = response
            .bytes_stream()
            .map_ok(|bytes| bytes.to_vec())
            .map_err(|e| SyncError::from(RemoteError::from(e)))
            .boxed();

        Ok(RemoteBody {
            content_type,
            chunks,
        })
    }
}
