//! Sync scheduler - turns time and user requests into sync passes
//!
//! The [`SyncScheduler`] drives a [`SyncEngine`]:
//!
//! ```text
//! startup ─────────────→ download()
//! every interval ──────→ upload()
//! ManualTrigger ───────→ upload()
//! every refresh ───────→ reporter.show_last_synced()
//! shutdown ────────────→ upload() (best-effort flush), then return
//! ```
//!
//! Passes run inline on the scheduler task, so a trigger can never overlap
//! a pass the scheduler itself started. Manual requests coalesce: while one
//! is pending, further requests are dropped.

use std::sync::Arc;
use std::time::Duration;

use freesync_core::config::Config;
use freesync_core::domain::{SyncDirection, SyncOutcome};
use freesync_core::ports::IStatusReporter;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::SyncEngine;

/// Shortest period a timer may have
const MIN_PERIOD: Duration = Duration::from_secs(1);

// ============================================================================
// SchedulerConfig
// ============================================================================

/// Timer settings for [`SyncScheduler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between scheduled uploads; the first one fires one period after start
    pub upload_interval: Duration,
    /// Time between "last synced" re-renders
    pub status_refresh: Duration,
}

impl SchedulerConfig {
    /// Timer settings taken from the application config
    pub fn from_config(config: &Config) -> Self {
        Self {
            upload_interval: config.remote.interval(),
            status_refresh: config.status.refresh(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// ============================================================================
// ManualTrigger
// ============================================================================

/// Cloneable handle that requests an immediate upload ("sync now")
#[derive(Debug, Clone)]
pub struct ManualTrigger {
    tx: mpsc::Sender<()>,
}

impl ManualTrigger {
    /// Requests an upload
    ///
    /// Returns `false` if a request is already pending (this one is merged
    /// into it) or the scheduler has stopped.
    pub fn trigger(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => {
                info!("User-initiated sync requested");
                true
            }
            Err(mpsc::error::TrySendError::Full(())) => {
                debug!("Sync request already pending, coalescing");
                false
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                debug!("Scheduler stopped, ignoring sync request");
                false
            }
        }
    }
}

// ============================================================================
// SyncScheduler
// ============================================================================

/// Runs sync passes on startup, on a timer, on request and at shutdown
pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
    reporter: Arc<dyn IStatusReporter + Send + Sync>,
    config: SchedulerConfig,
    manual_rx: mpsc::Receiver<()>,
    shutdown: CancellationToken,
}

impl SyncScheduler {
    /// Creates a new `SyncScheduler`
    ///
    /// # Arguments
    /// * `engine` - The engine passes are run on
    /// * `reporter` - Receives the periodic "last synced" refresh
    /// * `config` - Timer periods (clamped to at least one second)
    /// * `shutdown` - Cancelling this token flushes and stops the scheduler
    ///
    /// # Returns
    /// The scheduler and a [`ManualTrigger`] for "sync now" requests
    pub fn new(
        engine: Arc<SyncEngine>,
        reporter: Arc<dyn IStatusReporter + Send + Sync>,
        config: SchedulerConfig,
        shutdown: CancellationToken,
    ) -> (Self, ManualTrigger) {
        let (tx, manual_rx) = mpsc::channel(1);
        let config = SchedulerConfig {
            upload_interval: config.upload_interval.max(MIN_PERIOD),
            status_refresh: config.status_refresh.max(MIN_PERIOD),
        };

        info!(
            interval_secs = config.upload_interval.as_secs(),
            refresh_secs = config.status_refresh.as_secs(),
            "Creating sync scheduler"
        );

        let scheduler = Self {
            engine,
            reporter,
            config,
            manual_rx,
            shutdown,
        };
        (scheduler, ManualTrigger { tx })
    }

    /// Runs until the shutdown token is cancelled
    ///
    /// Errors from individual passes are logged and never end the loop.
    pub async fn run(mut self) {
        self.run_pass(SyncDirection::Download, "startup").await;

        let start = Instant::now();
        let mut upload_tick = interval_at(
            start + self.config.upload_interval,
            self.config.upload_interval,
        );
        upload_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut refresh_tick = interval_at(
            start + self.config.status_refresh,
            self.config.status_refresh,
        );
        refresh_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut manual_open = true;

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => break,

                _ = upload_tick.tick() => {
                    self.run_pass(SyncDirection::Upload, "interval").await;
                }

                request = self.manual_rx.recv(), if manual_open => match request {
                    Some(()) => self.run_pass(SyncDirection::Upload, "manual").await,
                    None => {
                        debug!("All manual triggers dropped");
                        manual_open = false;
                    }
                },

                _ = refresh_tick.tick() => {
                    self.reporter.show_last_synced(self.engine.state().last_synced_at);
                }
            }
        }

        info!("Scheduler shutting down, flushing vault");
        self.run_pass(SyncDirection::Upload, "shutdown").await;
    }

    async fn run_pass(&self, direction: SyncDirection, trigger: &'static str) {
        debug!(trigger, %direction, "Starting scheduled pass");
        let result = match direction {
            SyncDirection::Upload => self.engine.upload().await,
            SyncDirection::Download => self.engine.download().await,
        };
        match result {
            Ok(SyncOutcome::Completed(report)) => {
                debug!(trigger, %direction, files = report.files, "Scheduled pass complete");
            }
            Ok(SyncOutcome::Skipped) => {
                debug!(trigger, %direction, "Scheduled pass skipped");
            }
            Err(err) => {
                warn!(trigger, %direction, error = %err, "Scheduled pass failed");
            }
        }
    }
}

// ============================================================================
// Unit tests
// ============================================================================
