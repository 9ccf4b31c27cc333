//! Sync state and pass results
//!
//! [`SyncState`] is ephemeral: it lives as long as the engine that owns it
//! and is never persisted.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Whether a sync pass is currently running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No pass in flight
    #[default]
    Idle,
    /// An upload or download is in flight
    Syncing,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
        };
        write!(f, "{}", s)
    }
}

/// Process-wide sync state owned by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// When the last successful pass finished; `None` until the first one
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Current status
    pub status: SyncStatus,
}

/// Direction of a sync pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    /// Local vault pushed to the remote
    Upload,
    /// Remote vault pulled into the local store
    Download,
}

impl std::fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncDirection::Upload => "upload",
            SyncDirection::Download => "download",
        };
        write!(f, "{}", s)
    }
}

/// Summary of a completed sync pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub direction: SyncDirection,
    /// Files sent or materialized
    pub files: usize,
    /// Content bytes sent or materialized (multipart framing excluded)
    pub bytes: u64,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Completion time, also recorded as `last_synced_at`
    pub finished_at: DateTime<Utc>,
}

/// Result of asking the engine to run a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The pass ran to completion
    Completed(SyncReport),
    /// Another pass was already in flight; nothing was done
    Skipped,
}

impl SyncOutcome {
    /// Returns the report when the pass ran
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            SyncOutcome::Completed(report) => Some(report),
            SyncOutcome::Skipped => None,
        }
    }

    /// Whether the trigger was dropped because a pass was in flight
    pub fn is_skipped(&self) -> bool {
        matches!(self, SyncOutcome::Skipped)
    }
}

/// Renders the "last synced" status line
///
/// Recent passes are shown as elapsed time; anything older than an hour
/// shows the calendar date in local time.
pub fn describe_last_synced(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last) = last else {
        return "Not synced yet".to_string();
    };

    let elapsed = now.signed_duration_since(last);
    let minutes = elapsed.num_minutes();

    if minutes < 1 {
        "Synced just now".to_string()
    } else if minutes == 1 {
        "Synced 1 minute ago".to_string()
    } else if minutes < 60 {
        format!("Synced {} minutes ago", minutes)
    } else {
        format!(
            "Last synced {}",
            last.with_timezone(&Local).format("%a %b %d %Y")
        )
    }
}
