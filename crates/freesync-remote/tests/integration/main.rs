//! Integration tests for freesync-remote
//!
//! Uses wiremock to simulate the vault endpoint and verifies the wire
//! behaviour of HttpTransport uploads and downloads.

mod common;

mod test_download;
mod test_upload;
