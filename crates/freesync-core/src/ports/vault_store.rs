//! Vault store port (driven/secondary port)
//!
//! The File Enumerator: lists every file of the local vault, reads file
//! content on demand and writes downloaded files back.
//!
//! ## Design Notes
//!
//! - Enumeration is a snapshot taken at call time; files changing during
//!   the walk may or may not be reflected.
//! - Content is read per file so a pass never has to hold a second copy
//!   of the vault.
//! - There is no delete operation. Files missing from a downloaded set are
//!   left alone.
//! - `list_all` may exclude entries that `materialize` still accepts (the
//!   filesystem adapter skips hidden names). Such files can arrive by
//!   download but are never uploaded.

use crate::domain::{SyncError, VaultFile, VaultPath};

/// Port trait for local vault operations
#[async_trait::async_trait]
pub trait IVaultStore: Send + Sync {
    /// Lists every regular file in the vault
    ///
    /// Implementations may leave out entries they treat as outside the vault
    /// (such as hidden files), even if they were written by `materialize`.
    ///
    /// # Errors
    /// Returns `SyncError::Io` if a directory cannot be read
    async fn list_all(&self) -> Result<Vec<VaultFile>, SyncError>;

    /// Reads the full content of a file
    ///
    /// # Errors
    /// - `SyncError::NotFound` if the file disappeared after enumeration
    /// - `SyncError::Io` on any other read failure
    async fn read_content(&self, path: &VaultPath) -> Result<Vec<u8>, SyncError>;

    /// Creates or overwrites a file, creating parent directories as needed
    ///
    /// # Errors
    /// Returns `SyncError::Io` on permission or disk-space failures
    async fn materialize(&self, path: &VaultPath, content: &[u8]) -> Result<(), SyncError>;
}
