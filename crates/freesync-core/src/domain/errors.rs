//! Sync error taxonomy
//!
//! Every failure in a sync pass is one of these variants. None of them is
//! process-fatal: a failed pass leaves the engine idle and the next trigger
//! starts over from scratch.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during a sync pass
#[derive(Debug, Error)]
pub enum SyncError {
    /// An enumerated file vanished before it could be read
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// A local read or write failed
    #[error("IO error at {path}: {source}")]
    Io {
        /// The file or directory being accessed
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote host could not be reached, or the request timed out
    #[error("Network error: {0}")]
    Network(String),

    /// The remote host answered with a non-success status
    #[error("Remote returned HTTP {status_code}")]
    Remote {
        /// HTTP status code of the response
        status_code: u16,
    },

    /// A multipart body could not be decoded
    #[error("Malformed multipart body: {0}")]
    MalformedBody(String),

    /// A vault path is empty, absolute, or escapes the vault root
    #[error("Invalid vault path: {0}")]
    InvalidPath(String),

    /// The same path appeared twice in one transfer set
    #[error("Duplicate path in transfer set: {0}")]
    DuplicatePath(String),

    /// The requested multipart boundary occurs inside a part
    #[error("Boundary collides with part content: {0}")]
    BoundaryCollision(String),

    /// A download failed after some files had already been written
    ///
    /// Written files are not rolled back.
    #[error("Download aborted after writing {written} of {total} files: {source}")]
    PartiallyApplied {
        /// Files materialized before the failure
        written: usize,
        /// Files in the downloaded set
        total: usize,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    /// Wraps an `std::io::Error`, mapping `NotFound` to [`SyncError::NotFound`]
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            SyncError::NotFound(path)
        } else {
            SyncError::Io { path, source }
        }
    }

    /// Whether a later attempt could plausibly succeed without user action
    ///
    /// The engine never retries on its own; this is for callers that want
    /// to add backoff.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Network(_) => true,
            SyncError::Remote { status_code } => *status_code == 429 || *status_code >= 500,
            SyncError::PartiallyApplied { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
