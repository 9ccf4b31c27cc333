//! In-memory port fakes for unit tests

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use tokio::sync::Notify;

use freesync_core::config::RemoteConfig;
use freesync_core::domain::{SyncError, TransferSet, VaultFile, VaultPath};
use freesync_core::multipart::{self, EncodedBody};
use freesync_core::ports::{IRemoteTransport, IStatusReporter, IVaultStore, Notice, RemoteBody};

// ============================================================================
// MemoryVault
// ============================================================================

/// Vault held in a map, with injectable read and write failures
#[derive(Default)]
pub struct MemoryVault {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    failing_reads: Mutex<HashSet<String>>,
    failing_writes: Mutex<HashSet<String>>,
}

impl MemoryVault {
    pub fn with_files(files: &[(&str, &[u8])]) -> Self {
        let vault = Self::default();
        {
            let mut map = vault.files.lock().unwrap();
            for (path, content) in files {
                map.insert(path.to_string(), content.to_vec());
            }
        }
        vault
    }

    /// Reads of `path` fail as if the file vanished after enumeration
    pub fn fail_reads_of(&self, path: &VaultPath) {
        self.failing_reads.lock().unwrap().insert(path.to_string());
    }

    /// Writes of `path` fail with a permission error
    pub fn fail_writes_of(&self, path: &VaultPath) {
        self.failing_writes.lock().unwrap().insert(path.to_string());
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }
}

#[async_trait]
impl IVaultStore for MemoryVault {
    async fn list_all(&self) -> Result<Vec<VaultFile>, SyncError> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .map(|(p, c)| Ok(VaultFile::new(VaultPath::new(p.as_str())?, c.len() as u64)))
            .collect()
    }

    async fn read_content(&self, path: &VaultPath) -> Result<Vec<u8>, SyncError> {
        if self.failing_reads.lock().unwrap().contains(path.as_str()) {
            return Err(SyncError::NotFound(path.as_str().into()));
        }
        self.get(path.as_str())
            .ok_or_else(|| SyncError::NotFound(path.as_str().into()))
    }

    async fn materialize(&self, path: &VaultPath, content: &[u8]) -> Result<(), SyncError> {
        if self.failing_writes.lock().unwrap().contains(path.as_str()) {
            return Err(SyncError::Io {
                path: path.as_str().into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_vec());
        Ok(())
    }
}

// ============================================================================
// RecordingTransport
// ============================================================================

/// A transport call, in the order it was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Upload(String),
    Download(String),
}

/// An upload as the transport received it
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub host: String,
    pub vault_id: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl RecordedUpload {
    pub fn decode(&self) -> TransferSet {
        let boundary = multipart::boundary_from_content_type(&self.content_type).unwrap();
        multipart::decode(&self.body, &boundary).unwrap()
    }
}

/// Transport that records uploads and serves a canned download body
pub struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
    uploads: Mutex<Vec<RecordedUpload>>,
    serving: Mutex<(EncodedBody, usize)>,
    fail_next: Mutex<Option<SyncError>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        let empty = multipart::encode(&TransferSet::new()).unwrap();
        Self {
            calls: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            serving: Mutex::new((empty, usize::MAX)),
            fail_next: Mutex::new(None),
        }
    }

    /// Serves `body` in one chunk on every download
    pub fn serve(&self, body: EncodedBody) {
        *self.serving.lock().unwrap() = (body, usize::MAX);
    }

    /// Serves `body` split into chunks of `chunk_size` bytes
    pub fn serve_chunked(&self, body: EncodedBody, chunk_size: usize) {
        *self.serving.lock().unwrap() = (body, chunk_size);
    }

    /// The next call fails with `err`
    pub fn fail_next_with(&self, err: SyncError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    fn take_failure(&self) -> Result<(), SyncError> {
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IRemoteTransport for RecordingTransport {
    async fn upload(
        &self,
        config: &RemoteConfig,
        vault_id: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), SyncError> {
        self.calls
            .lock()
            .unwrap()
            .push(TransportCall::Upload(vault_id.to_string()));
        self.take_failure()?;
        self.uploads.lock().unwrap().push(RecordedUpload {
            host: config.host.clone(),
            vault_id: vault_id.to_string(),
            content_type: content_type.to_string(),
            body,
        });
        Ok(())
    }

    async fn download(
        &self,
        _config: &RemoteConfig,
        vault_id: &str,
    ) -> Result<RemoteBody, SyncError> {
        self.calls
            .lock()
            .unwrap()
            .push(TransportCall::Download(vault_id.to_string()));
        self.take_failure()?;
        let (body, chunk_size) = self.serving.lock().unwrap().clone();
        Ok(chunked(body, chunk_size))
    }
}

fn chunked(body: EncodedBody, chunk_size: usize) -> RemoteBody {
    let chunks: Vec<Result<Vec<u8>, SyncError>> = body
        .body
        .chunks(chunk_size.max(1))
        .map(|c| Ok(c.to_vec()))
        .collect();
    RemoteBody {
        content_type: body.content_type,
        chunks: stream::iter(chunks).boxed(),
    }
}

// ============================================================================
// BlockingTransport
// ============================================================================

/// Transport whose calls park until [`BlockingTransport::release`]
///
/// Lets a test hold a pass in flight while it triggers another one.
pub struct BlockingTransport {
    body: EncodedBody,
    calls: Mutex<Vec<TransportCall>>,
    entered: Notify,
    released: AtomicBool,
    release_notify: Notify,
}

impl BlockingTransport {
    pub fn new(body: EncodedBody) -> Self {
        Self {
            body,
            calls: Mutex::new(Vec::new()),
            entered: Notify::new(),
            released: AtomicBool::new(false),
            release_notify: Notify::new(),
        }
    }

    /// Resolves once a call has reached the transport
    pub async fn wait_until_entered(&self) {
        self.entered.notified().await;
    }

    /// Lets parked and future calls through
    pub fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
        self.release_notify.notify_waiters();
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn park(&self, call: TransportCall) {
        self.calls.lock().unwrap().push(call);
        self.entered.notify_one();
        loop {
            let notified = self.release_notify.notified();
            if self.released.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl IRemoteTransport for BlockingTransport {
    async fn upload(
        &self,
        _config: &RemoteConfig,
        vault_id: &str,
        _body: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), SyncError> {
        self.park(TransportCall::Upload(vault_id.to_string())).await;
        Ok(())
    }

    async fn download(
        &self,
        _config: &RemoteConfig,
        vault_id: &str,
    ) -> Result<RemoteBody, SyncError> {
        self.park(TransportCall::Download(vault_id.to_string())).await;
        Ok(chunked(self.body.clone(), usize::MAX))
    }
}

// ============================================================================
// RecordingReporter
// ============================================================================

/// A reporter call, in the order it was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReporterEvent {
    Status(String),
    Notice(Notice),
    LastSynced(Option<DateTime<Utc>>),
}

/// Reporter that records every call
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReporterEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReporterEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl IStatusReporter for RecordingReporter {
    fn status_text(&self, text: &str) {
        self.events
            .lock()
            .unwrap()
            .push(ReporterEvent::Status(text.to_string()));
    }

    fn notify(&self, notice: &Notice) {
        self.events
            .lock()
            .unwrap()
            .push(ReporterEvent::Notice(notice.clone()));
    }

    fn show_last_synced(&self, last_synced_at: Option<DateTime<Utc>>) {
        self.events
            .lock()
            .unwrap()
            .push(ReporterEvent::LastSynced(last_synced_at));
    }
}
