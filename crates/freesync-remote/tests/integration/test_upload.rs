//! Integration tests for HttpTransport::upload
//!
//! Verifies method, path, headers and body of the upload request, and the
//! mapping of failures to SyncError.

use std::time::Duration;

use freesync_core::multipart;
use freesync_core::ports::IRemoteTransport;
use freesync_core::SyncError;
use freesync_remote::HttpTransport;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_upload_sends_multipart_body() {
    let server = MockServer::start().await;
    common::mount_upload(&server, 200).await;

    let set = common::transfer_set(&[("a.md", b"hello"), ("sub/b.md", b"world")]);
    let encoded = multipart::encode(&set).unwrap();

    HttpTransport::new()
        .upload(
            &common::remote_config(&server),
            common::VAULT_ID,
            encoded.body.clone(),
            &encoded.content_type,
        )
        .await
        .expect("upload failed");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    assert_eq!(request.url.path(), "/vault/test-vault");
    let content_type = request
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(content_type, encoded.content_type);
    assert_eq!(request.body, encoded.body);

    let boundary = multipart::boundary_from_content_type(content_type).unwrap();
    let received = multipart::decode(&request.body, &boundary).unwrap();
    assert_eq!(received, set);
}

#[tokio::test]
async fn test_upload_never_sends_password() {
    let server = MockServer::start().await;
    common::mount_upload(&server, 204).await;

    let encoded = multipart::encode(&common::transfer_set(&[])).unwrap();
    HttpTransport::new()
        .upload(
            &common::remote_config(&server),
            common::VAULT_ID,
            encoded.body,
            &encoded.content_type,
        )
        .await
        .expect("upload failed");

    let requests = server.received_requests().await.unwrap();
    for value in requests[0].headers.values() {
        assert!(!value.to_str().unwrap_or_default().contains("never-sent"));
    }
}

#[tokio::test]
async fn test_upload_any_2xx_is_success() {
    for status in [200, 201, 202, 204] {
        let server = MockServer::start().await;
        common::mount_upload(&server, status).await;

        let result = HttpTransport::new()
            .upload(
                &common::remote_config(&server),
                common::VAULT_ID,
                Vec::new(),
                "multipart/form-data; boundary=x",
            )
            .await;
        assert!(result.is_ok(), "status {status} should succeed");
    }
}

#[tokio::test]
async fn test_upload_error_status_maps_to_remote_error() {
    let server = MockServer::start().await;
    common::mount_upload(&server, 500).await;

    let err = HttpTransport::new()
        .upload(
            &common::remote_config(&server),
            common::VAULT_ID,
            Vec::new(),
            "multipart/form-data; boundary=x",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Remote { status_code: 500 }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_upload_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut config = common::remote_config(&server);
    config.username = "someone-else".to_string();

    let err = HttpTransport::new()
        .upload(&config, common::VAULT_ID, Vec::new(), "multipart/form-data; boundary=x")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Remote { status_code: 401 }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_upload_connection_refused_is_network_error() {
    let server = MockServer::start().await;
    let mut config = common::remote_config(&server);
    drop(server);
    // Nothing listens on the dropped server's port any more.
    config.timeout_secs = 5;

    let err = HttpTransport::new()
        .upload(&config, common::VAULT_ID, Vec::new(), "multipart/form-data; boundary=x")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn test_upload_timeout_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let mut config = common::remote_config(&server);
    config.timeout_secs = 1;

    let err = HttpTransport::new()
        .upload(&config, common::VAULT_ID, Vec::new(), "multipart/form-data; boundary=x")
        .await
        .unwrap_err();
    match err {
        SyncError::Network(msg) => assert!(msg.contains("timed out"), "got {msg}"),
        other => panic!("expected network error, got {other:?}"),
    }
}
