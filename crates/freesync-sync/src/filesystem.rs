//! Local vault adapter (secondary/driven adapter)
//!
//! Implements [`IVaultStore`] on top of `tokio::fs`, rooted at the vault
//! directory.
//!
//! ## Design Decisions
//!
//! - **Hidden entries**: names starting with `.` are not part of the vault
//!   (editor state, VCS metadata, our own temp files) and are skipped along
//!   with everything below them. This only applies to enumeration: a
//!   downloaded part such as `.foo/bar` is still written, but it is never
//!   listed and so never uploaded again.
//! - **Symlinks**: not followed, so a link cycle cannot hang the walk.
//! - **Atomic writes**: content goes to a hidden temp file in the target
//!   directory, then is renamed over the target. The temp name has a fixed
//!   length, so any name that fits on disk can be written.

use std::path::{Path, PathBuf};

use freesync_core::domain::{SyncError, VaultFile, VaultPath};
use freesync_core::ports::IVaultStore;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Prefix of the temp files used for atomic writes
const TMP_PREFIX: &str = ".freesync-";

// ============================================================================
// LocalVaultAdapter
// ============================================================================

/// Adapter that bridges the [`IVaultStore`] port to a directory on disk
#[derive(Debug, Clone)]
pub struct LocalVaultAdapter {
    root: PathBuf,
}

impl LocalVaultAdapter {
    /// Create an adapter for the vault rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The vault root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Recursively collects the files below `dir`
    fn walk_directory<'a>(
        &'a self,
        dir: PathBuf,
        files: &'a mut Vec<VaultFile>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), SyncError>> + Send + 'a>>
    {
        Box::pin(async move {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| SyncError::from_io(&dir, e))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| SyncError::from_io(&dir, e))?
            {
                let entry_path = entry.path();
                if is_hidden(&entry_path) {
                    continue;
                }

                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| SyncError::from_io(&entry_path, e))?;

                if file_type.is_dir() {
                    self.walk_directory(entry_path, files).await?;
                } else if file_type.is_file() {
                    let relative = match entry_path.strip_prefix(&self.root) {
                        Ok(r) => r,
                        Err(_) => continue,
                    };
                    let path = match VaultPath::from_relative(relative) {
                        Ok(p) => p,
                        Err(err) => {
                            warn!(path = ?entry_path, %err, "Skipping unrepresentable path");
                            continue;
                        }
                    };
                    let size = entry
                        .metadata()
                        .await
                        .map_err(|e| SyncError::from_io(&entry_path, e))?
                        .len();
                    files.push(VaultFile::new(path, size));
                } else {
                    debug!(path = ?entry_path, "Skipping non-regular entry");
                }
            }

            Ok(())
        })
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// A unique hidden sibling of `target`, independent of its name length
fn tmp_path_for(target: &Path) -> PathBuf {
    target.with_file_name(format!("{TMP_PREFIX}{}.tmp", Uuid::new_v4().simple()))
}

// ============================================================================
// IVaultStore implementation
// ============================================================================

#[async_trait::async_trait]
impl IVaultStore for LocalVaultAdapter {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn list_all(&self) -> Result<Vec<VaultFile>, SyncError> {
        let mut files = Vec::new();
        self.walk_directory(self.root.clone(), &mut files).await?;
        files.sort();
        debug!(count = files.len(), "vault enumerated");
        Ok(files)
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn read_content(&self, path: &VaultPath) -> Result<Vec<u8>, SyncError> {
        let local = path.to_local(&self.root);
        let data = tokio::fs::read(&local)
            .await
            .map_err(|e| SyncError::from_io(&local, e))?;
        debug!(bytes = data.len(), "file read complete");
        Ok(data)
    }

    #[instrument(skip(self, content), fields(path = %path, bytes = content.len()))]
    async fn materialize(&self, path: &VaultPath, content: &[u8]) -> Result<(), SyncError> {
        let target = path.to_local(&self.root);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::from_io(parent, e))?;
        }

        let tmp_path = tmp_path_for(&target);
        debug!(?tmp_path, "writing to temporary file");
        if let Err(e) = tokio::fs::write(&tmp_path, content).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(SyncError::Io {
                path: target,
                source: e,
            });
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &target).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(SyncError::Io {
                path: target,
                source: e,
            });
        }

        debug!("write complete");
        Ok(())
    }
}

// ============================================================================
// Unit tests
// ============================================================================
