//! Vault files and transfer sets
//!
//! A [`VaultFile`] is one enumerated entry of the local store; its bytes are
//! read on demand through the vault store port. A [`TransferSet`] is the full
//! set of `(path, content)` pairs carried by one multipart payload.

use std::collections::btree_map::{self, BTreeMap};

use super::errors::SyncError;
use super::newtypes::VaultPath;

/// One file in the local vault, identified by its relative path
///
/// Enumerated fresh on every sync pass and never cached across passes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VaultFile {
    path: VaultPath,
    size: u64,
}

impl VaultFile {
    /// Creates a new VaultFile
    pub fn new(path: VaultPath, size: u64) -> Self {
        Self { path, size }
    }

    /// Relative path inside the vault
    pub fn path(&self) -> &VaultPath {
        &self.path
    }

    /// Size observed at enumeration time (may be stale by read time)
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// A set of files carried by one multipart payload
///
/// Paths are unique within a set. Iteration is in path order, which keeps
/// encoded bodies deterministic for a given set and boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferSet {
    entries: BTreeMap<VaultPath, Vec<u8>>,
}

impl TransferSet {
    /// Creates an empty transfer set
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry
    ///
    /// # Errors
    /// Returns `SyncError::DuplicatePath` if the path is already present
    pub fn insert(&mut self, path: VaultPath, content: Vec<u8>) -> Result<(), SyncError> {
        match self.entries.entry(path) {
            btree_map::Entry::Occupied(occupied) => {
                Err(SyncError::DuplicatePath(occupied.key().to_string()))
            }
            btree_map::Entry::Vacant(vacant) => {
                vacant.insert(content);
                Ok(())
            }
        }
    }

    /// Returns the content stored for `path`
    pub fn get(&self, path: &VaultPath) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all content lengths
    pub fn total_bytes(&self) -> u64 {
        self.entries.values().map(|c| c.len() as u64).sum()
    }

    /// Iterates entries in path order
    pub fn iter(&self) -> impl Iterator<Item = (&VaultPath, &[u8])> {
        self.entries.iter().map(|(p, c)| (p, c.as_slice()))
    }
}

impl IntoIterator for TransferSet {
    type Item = (VaultPath, Vec<u8>);
    type IntoIter = btree_map::IntoIter<VaultPath, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
