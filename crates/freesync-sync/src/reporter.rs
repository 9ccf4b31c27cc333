//! Tracing-backed status reporter
//!
//! Headless stand-in for a status bar: every status change and notice becomes
//! a structured log event, and the latest status line is kept so callers
//! can render it on demand.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use freesync_core::domain::describe_last_synced;
use freesync_core::ports::{IStatusReporter, Notice, NoticeKind};
use tracing::{debug, info, warn};

/// [`IStatusReporter`] that writes to `tracing`
#[derive(Debug, Default)]
pub struct TracingStatusReporter {
    current: Mutex<String>,
}

impl TracingStatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent status line
    pub fn current_text(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, text: &str) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.clear();
        current.push_str(text);
    }
}

impl IStatusReporter for TracingStatusReporter {
    fn status_text(&self, text: &str) {
        info!(status = text, "Status updated");
        self.set(text);
    }

    fn notify(&self, notice: &Notice) {
        match notice.kind {
            NoticeKind::Success => info!(notice = %notice.body, "Sync notice"),
            NoticeKind::Failure => warn!(notice = %notice.body, "Sync failure notice"),
        }
    }

    fn show_last_synced(&self, last_synced_at: Option<DateTime<Utc>>) {
        let text = describe_last_synced(last_synced_at, Utc::now());
        debug!(status = %text, "Last synced refreshed");
        self.set(&text);
    }
}
