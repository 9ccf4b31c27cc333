//! Status reporter port (driven/secondary port)
//!
//! The surface the sync engine talks to while it works. Three kinds of
//! signal go through it:
//!
//! - transient status text ("Syncing...", "Synced just now")
//! - one-shot notices when a pass succeeds or fails
//! - a periodic "last synced" re-render driven by the scheduler
//!
//! ## Design Notes
//!
//! - Methods are synchronous and infallible. Reporting must never be the
//!   reason a pass fails; implementations swallow their own errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status text shown while a pass is in flight
pub const STATUS_SYNCING: &str = "Syncing...";

/// Status text shown right after a successful pass
pub const STATUS_SYNCED: &str = "Synced just now";

/// Status text shown after a failed pass
pub const STATUS_FAILED: &str = "Sync failed";

/// Body of the notice sent after a successful pass
pub const NOTICE_COMPLETE: &str = "Sync complete!";

/// Kind of one-shot notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// A pass completed
    Success,
    /// A pass failed; the body carries the error
    Failure,
}

impl std::fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NoticeKind::Success => "success",
            NoticeKind::Failure => "failure",
        };
        write!(f, "{}", s)
    }
}

/// A one-shot notice for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub body: String,
}

impl Notice {
    /// Creates a success notice
    pub fn success(body: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            body: body.into(),
        }
    }

    /// Creates a failure notice
    pub fn failure(body: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            body: body.into(),
        }
    }

    /// Whether this notice reports a failure
    pub fn is_failure(&self) -> bool {
        self.kind == NoticeKind::Failure
    }
}

/// Port trait for status and notice display
pub trait IStatusReporter: Send + Sync {
    /// Replaces the transient status text
    fn status_text(&self, text: &str);

    /// Shows a one-shot notice
    fn notify(&self, notice: &Notice);

    /// Re-renders the "last synced" display
    fn show_last_synced(&self, last_synced_at: Option<DateTime<Utc>>);
}
