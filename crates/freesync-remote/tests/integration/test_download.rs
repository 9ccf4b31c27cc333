//! Integration tests for HttpTransport::download
//!
//! Verifies the request shape and that the streamed body decodes back into
//! the set the server encoded.

use freesync_core::multipart::MultipartDecoder;
use freesync_core::ports::{IRemoteTransport, RemoteBody};
use freesync_core::SyncError;
use freesync_remote::HttpTransport;
use futures_util::StreamExt;
use wiremock::MockServer;

use crate::common;

async fn collect(body: RemoteBody) -> Vec<u8> {
    let mut chunks = body.chunks;
    let mut out = Vec::new();
    while let Some(chunk) = chunks.next().await {
        out.extend_from_slice(&chunk.expect("chunk failed"));
    }
    out
}

#[tokio::test]
async fn test_download_returns_content_type_and_body() {
    let server = MockServer::start().await;
    let set = common::transfer_set(&[("x.md", b"1"), ("y/z.md", b"2")]);
    let encoded = common::mount_download(&server, &set).await;

    let body = HttpTransport::new()
        .download(&common::remote_config(&server), common::VAULT_ID)
        .await
        .expect("download failed");

    assert_eq!(body.content_type, encoded.content_type);
    assert_eq!(collect(body).await, encoded.body);
}

#[tokio::test]
async fn test_download_streams_into_decoder() {
    let server = MockServer::start().await;
    let large: Vec<u8> = (0..1_048_576).map(|i| (i % 251) as u8).collect();
    let set = common::transfer_set(&[("big.bin", &large), ("empty.md", b"")]);
    common::mount_download(&server, &set).await;

    let body = HttpTransport::new()
        .download(&common::remote_config(&server), common::VAULT_ID)
        .await
        .expect("download failed");

    let mut decoder = MultipartDecoder::from_content_type(&body.content_type).unwrap();
    let mut chunks = body.chunks;
    while let Some(chunk) = chunks.next().await {
        decoder.feed(&chunk.unwrap()).unwrap();
    }
    assert_eq!(decoder.finish().unwrap(), set);
}

#[tokio::test]
async fn test_download_empty_vault() {
    let server = MockServer::start().await;
    let set = common::transfer_set(&[]);
    let encoded = common::mount_download(&server, &set).await;

    let body = HttpTransport::new()
        .download(&common::remote_config(&server), common::VAULT_ID)
        .await
        .expect("download failed");
    assert_eq!(collect(body).await, encoded.body);
}

#[tokio::test]
async fn test_download_not_found_maps_to_remote_error() {
    let server = MockServer::start().await;
    common::mount_download_status(&server, 404).await;

    let err = HttpTransport::new()
        .download(&common::remote_config(&server), common::VAULT_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Remote { status_code: 404 }));
}

#[tokio::test]
async fn test_download_invalid_host_is_network_error() {
    let server = MockServer::start().await;
    let mut config = common::remote_config(&server);
    config.host = "not a url".to_string();

    let err = HttpTransport::new()
        .download(&config, common::VAULT_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Network(_)));
}
