//! Vault sync engine
//!
//! The [`SyncEngine`] runs whole-vault passes in either direction:
//!
//! 1. **Upload** (push): enumerate, encode each file as it is read, `POST`
//! 2. **Download** (pull): `GET`, decode the full body, write every entry
//!
//! ## Serialization
//!
//! At most one pass is in flight. A pass that is requested while another is
//! running is dropped with an info log and returns [`SyncOutcome::Skipped`].
//! The status flag is reset by a drop guard, so a failed, panicking or
//! cancelled pass never leaves the engine stuck in `Syncing`.
//!
//! ## Failure model
//!
//! Every error aborts the pass. Nothing is retried here; the next trigger
//! starts a fresh pass. An upload sends nothing unless every file was read.
//! A download writes nothing unless the body decoded cleanly, but files
//! written before a mid-way write failure stay written
//! ([`SyncError::PartiallyApplied`]).

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

use chrono::Utc;
use futures_util::StreamExt;
use tracing::{debug, info, warn};

use freesync_core::config::RemoteConfig;
use freesync_core::domain::{
    vault_id, SyncDirection, SyncError, SyncOutcome, SyncReport, SyncState, SyncStatus,
    VaultFile,
};
use freesync_core::multipart::{self, MultipartDecoder, MultipartEncoder};
use freesync_core::ports::status_reporter::{
    NOTICE_COMPLETE, STATUS_FAILED, STATUS_SYNCED, STATUS_SYNCING,
};
use freesync_core::ports::{IRemoteTransport, IStatusReporter, IVaultStore, Notice};

// ============================================================================
// PassGuard
// ============================================================================

/// Holds the `Syncing` status for the duration of one pass
///
/// Dropping the guard always returns the status to `Idle`.
struct PassGuard<'a> {
    state: &'a Mutex<SyncState>,
}

impl<'a> PassGuard<'a> {
    /// Flips `Idle` to `Syncing`, or returns `None` if a pass is running
    fn acquire(state: &'a Mutex<SyncState>) -> Option<Self> {
        let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
        if s.status == SyncStatus::Syncing {
            return None;
        }
        s.status = SyncStatus::Syncing;
        Some(Self { state })
    }

    /// Records a successful pass and releases the status
    fn complete(
        self,
        direction: SyncDirection,
        files: usize,
        bytes: u64,
        started: Instant,
    ) -> SyncReport {
        let finished_at = Utc::now();
        {
            let mut s = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            s.last_synced_at = Some(finished_at);
            s.status = SyncStatus::Idle;
        }
        SyncReport {
            direction,
            files,
            bytes,
            duration_ms: started.elapsed().as_millis() as u64,
            finished_at,
        }
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        let mut s = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        s.status = SyncStatus::Idle;
    }
}

// ============================================================================
// SyncEngine
// ============================================================================

/// Whole-vault sync engine
///
/// Owns the [`SyncState`] and talks to the outside world only through ports.
pub struct SyncEngine {
    /// Local vault operations
    vault: Arc<dyn IVaultStore + Send + Sync>,
    /// Remote endpoint operations
    transport: Arc<dyn IRemoteTransport + Send + Sync>,
    /// Status and notice surface
    reporter: Arc<dyn IStatusReporter + Send + Sync>,
    /// Remote settings; snapshotted at the start of every pass
    config: RwLock<RemoteConfig>,
    /// Remote resource key for this vault
    vault_id: String,
    /// Last-synced time and in-flight status
    state: Mutex<SyncState>,
}

impl SyncEngine {
    /// Creates a new `SyncEngine`
    ///
    /// # Arguments
    /// * `vault` - Local vault operations (IVaultStore)
    /// * `transport` - Remote endpoint operations (IRemoteTransport)
    /// * `reporter` - Status surface (IStatusReporter)
    /// * `config` - Remote settings for the first pass
    /// * `vault_name` - Display name the remote vault id is derived from
    pub fn new(
        vault: Arc<dyn IVaultStore + Send + Sync>,
        transport: Arc<dyn IRemoteTransport + Send + Sync>,
        reporter: Arc<dyn IStatusReporter + Send + Sync>,
        config: RemoteConfig,
        vault_name: &str,
    ) -> Self {
        let vault_id = vault_id(vault_name);
        if vault_id.is_empty() {
            warn!(vault_name, "Vault name yields an empty vault id");
        }
        info!(vault_id = %vault_id, host = %config.host, "Creating sync engine");
        Self {
            vault,
            transport,
            reporter,
            config: RwLock::new(config),
            vault_id,
            state: Mutex::new(SyncState::default()),
        }
    }

    /// Current sync state
    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The remote resource key for this vault
    pub fn vault_id(&self) -> &str {
        &self.vault_id
    }

    /// A copy of the remote settings the next pass will use
    pub fn config(&self) -> RemoteConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the remote settings
    ///
    /// A pass already in flight keeps the settings it started with.
    pub fn update_config(&self, config: RemoteConfig) {
        info!(host = %config.host, "Remote settings updated");
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    // ========================================================================
    // Upload
    // ========================================================================

    /// Pushes the whole local vault to the remote
    ///
    /// # Errors
    /// - `NotFound` / `Io` if a file cannot be read (no request is sent)
    /// - `Network` / `Remote` if the request fails
    #[tracing::instrument(skip(self), fields(vault_id = %self.vault_id))]
    pub async fn upload(&self) -> Result<SyncOutcome, SyncError> {
        let Some(guard) = PassGuard::acquire(&self.state) else {
            info!("sync already in progress, skipping");
            return Ok(SyncOutcome::Skipped);
        };
        let started = Instant::now();
        self.reporter.status_text(STATUS_SYNCING);
        let config = self.config();

        match self.push(&config).await {
            Ok((files, bytes)) => {
                let report = guard.complete(SyncDirection::Upload, files, bytes, started);
                info!(files, bytes, duration_ms = report.duration_ms, "Upload complete");
                self.report_success();
                Ok(SyncOutcome::Completed(report))
            }
            Err(err) => {
                drop(guard);
                self.report_failure(&err);
                Err(err)
            }
        }
    }

    async fn push(&self, config: &RemoteConfig) -> Result<(usize, u64), SyncError> {
        let files = self.vault.list_all().await?;
        info!(count = files.len(), "Reading vault files");

        let mut attempts = 0;
        let encoder = loop {
            attempts += 1;
            match self.encode_files(&files, &multipart::generate_boundary()).await {
                Err(SyncError::BoundaryCollision(path))
                    if attempts < multipart::MAX_BOUNDARY_ATTEMPTS =>
                {
                    debug!(%path, "Boundary occurs in file, choosing another");
                }
                other => break other?,
            }
        };

        let (count, bytes) = (encoder.parts(), encoder.content_bytes());
        let encoded = encoder.finish();
        debug!(body_bytes = encoded.body.len(), "Encoded upload body");

        self.transport
            .upload(config, &self.vault_id, encoded.body, &encoded.content_type)
            .await?;
        Ok((count, bytes))
    }

    /// Reads every file straight into the body, one file in memory at a time
    async fn encode_files(
        &self,
        files: &[VaultFile],
        boundary: &str,
    ) -> Result<MultipartEncoder, SyncError> {
        let capacity = files.iter().map(|f| f.size()).sum::<u64>();
        let mut encoder = MultipartEncoder::with_capacity(boundary, capacity as usize)?;
        for file in files {
            let content = self.vault.read_content(file.path()).await?;
            debug!(path = %file.path(), bytes = content.len(), "Read file");
            encoder.push(file.path(), &content)?;
        }
        Ok(encoder)
    }

    // ========================================================================
    // Download
    // ========================================================================

    /// Pulls the whole remote vault and overwrites the local copies
    ///
    /// Local files missing from the remote set are left alone.
    ///
    /// # Errors
    /// - `Network` / `Remote` if the request fails
    /// - `MalformedBody` / `InvalidPath` if the body cannot be decoded
    ///   (nothing is written)
    /// - `PartiallyApplied` if writing fails after the body decoded
    #[tracing::instrument(skip(self), fields(vault_id = %self.vault_id))]
    pub async fn download(&self) -> Result<SyncOutcome, SyncError> {
        let Some(guard) = PassGuard::acquire(&self.state) else {
            info!("sync already in progress, skipping");
            return Ok(SyncOutcome::Skipped);
        };
        let started = Instant::now();
        self.reporter.status_text(STATUS_SYNCING);
        let config = self.config();

        match self.pull(&config).await {
            Ok((files, bytes)) => {
                let report = guard.complete(SyncDirection::Download, files, bytes, started);
                info!(files, bytes, duration_ms = report.duration_ms, "Download complete");
                self.report_success();
                Ok(SyncOutcome::Completed(report))
            }
            Err(err) => {
                drop(guard);
                self.report_failure(&err);
                Err(err)
            }
        }
    }

    async fn pull(&self, config: &RemoteConfig) -> Result<(usize, u64), SyncError> {
        let body = self.transport.download(config, &self.vault_id).await?;

        let mut decoder = MultipartDecoder::from_content_type(&body.content_type)?;
        let mut chunks = body.chunks;
        while let Some(chunk) = chunks.next().await {
            decoder.feed(&chunk?)?;
        }
        let set = decoder.finish()?;

        let (total, bytes) = (set.len(), set.total_bytes());
        info!(count = total, bytes, "Decoded download body");

        for (written, (path, content)) in set.into_iter().enumerate() {
            if let Err(source) = self.vault.materialize(&path, &content).await {
                warn!(%path, written, total, "Write failed, earlier files stay written");
                return Err(SyncError::PartiallyApplied {
                    written,
                    total,
                    source: Box::new(source),
                });
            }
            debug!(%path, bytes = content.len(), "Materialized file");
        }

        Ok((total, bytes))
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    fn report_success(&self) {
        self.reporter.notify(&Notice::success(NOTICE_COMPLETE));
        self.reporter.status_text(STATUS_SYNCED);
    }

    fn report_failure(&self, err: &SyncError) {
        warn!(error = %err, retryable = err.is_retryable(), "Sync pass failed");
        self.reporter.notify(&Notice::failure(err.to_string()));
        self.reporter.status_text(STATUS_FAILED);
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("vault_id", &self.vault_id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Unit tests
// ============================================================================
