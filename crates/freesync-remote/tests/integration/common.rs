//! Shared test helpers for vault endpoint integration tests
//!
//! Each helper mounts mock endpoints on a wiremock server. `remote_config`
//! returns a config pointing at that server.

use freesync_core::config::RemoteConfig;
use freesync_core::domain::{TransferSet, VaultPath};
use freesync_core::multipart::{self, EncodedBody};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Vault id used by every test
pub const VAULT_ID: &str = "test-vault";

/// Bearer token (username) used by every test
pub const USERNAME: &str = "test-user";

/// Returns a remote config pointing at the mock server
pub fn remote_config(server: &MockServer) -> RemoteConfig {
    RemoteConfig {
        host: server.uri(),
        username: USERNAME.to_string(),
        password: "never-sent".to_string(),
        ..RemoteConfig::default()
    }
}

/// Builds a transfer set from `(path, content)` pairs
pub fn transfer_set(entries: &[(&str, &[u8])]) -> TransferSet {
    let mut set = TransferSet::new();
    for (p, content) in entries {
        set.insert(VaultPath::new(*p).unwrap(), content.to_vec())
            .unwrap();
    }
    set
}

/// Mounts `POST /vault/{VAULT_ID}` answering with `status`
pub async fn mount_upload(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path(format!("/vault/{VAULT_ID}")))
        .and(header("authorization", format!("Bearer {USERNAME}").as_str()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mounts `GET /vault/{VAULT_ID}` answering with the encoded set
pub async fn mount_download(server: &MockServer, set: &TransferSet) -> EncodedBody {
    let encoded = multipart::encode(set).unwrap();
    Mock::given(method("GET"))
        .and(path(format!("/vault/{VAULT_ID}")))
        .and(header("authorization", format!("Bearer {USERNAME}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(encoded.body.clone(), &encoded.content_type),
        )
        .mount(server)
        .await;
    encoded
}

/// Mounts `GET /vault/{VAULT_ID}` answering with `status` and no body
pub async fn mount_download_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/vault/{VAULT_ID}")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
