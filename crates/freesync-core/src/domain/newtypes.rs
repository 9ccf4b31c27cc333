//! Domain newtypes with validation
//!
//! [`VaultPath`] is the cross-system identity of a file: the same string is
//! used as the multipart part name on the wire and as the relative location
//! under the local vault root.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::SyncError;

// ============================================================================
// VaultPath
// ============================================================================

/// A validated, relative, `/`-separated path inside a vault
///
/// Construction rejects anything that could resolve outside the vault root
/// once joined to it: absolute paths, `.` and `..` components, empty
/// components, backslashes and NUL bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VaultPath(String);

impl VaultPath {
    /// Create a new VaultPath
    ///
    /// # Errors
    /// Returns `SyncError::InvalidPath` if the path is not a clean relative path
    pub fn new(path: impl Into<String>) -> Result<Self, SyncError> {
        let path = path.into();

        if path.is_empty() {
            return Err(SyncError::InvalidPath("path is empty".to_string()));
        }
        if path.starts_with('/') {
            return Err(SyncError::InvalidPath(format!("path must be relative: {path}")));
        }
        if path.contains('\\') || path.contains('\0') {
            return Err(SyncError::InvalidPath(format!(
                "path contains a forbidden character: {path:?}"
            )));
        }
        for component in path.split('/') {
            if component.is_empty() || component == "." || component == ".." {
                return Err(SyncError::InvalidPath(format!(
                    "invalid path component {component:?} in {path}"
                )));
            }
        }

        Ok(Self(path))
    }

    /// Build a VaultPath from a filesystem path relative to the vault root
    ///
    /// # Errors
    /// Returns `SyncError::InvalidPath` for non-UTF-8 components or anything
    /// [`VaultPath::new`] rejects
    pub fn from_relative(relative: &Path) -> Result<Self, SyncError> {
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                std::path::Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        SyncError::InvalidPath(format!(
                            "non UTF-8 path: {}",
                            relative.display()
                        ))
                    })?;
                    parts.push(part);
                }
                _ => {
                    return Err(SyncError::InvalidPath(format!(
                        "not a plain relative path: {}",
                        relative.display()
                    )))
                }
            }
        }
        Self::new(parts.join("/"))
    }

    /// Get the path as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final component of the path
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Resolve this path under a vault root directory
    #[must_use]
    pub fn to_local(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
    }
}

impl Display for VaultPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VaultPath {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for VaultPath {
    type Error = SyncError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VaultPath> for String {
    fn from(path: VaultPath) -> Self {
        path.0
    }
}

impl AsRef<str> for VaultPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
