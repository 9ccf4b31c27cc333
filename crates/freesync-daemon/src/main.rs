//! FreeSync Daemon - Background vault synchronization service
//!
//! This binary runs as a user service and handles:
//! - A full download of the remote vault at startup
//! - Periodic full uploads on the configured interval
//! - "Sync now" requests on SIGUSR1
//! - A final upload and graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon loads the YAML config, wires the filesystem and HTTP adapters
//! into a `SyncEngine`, and hands it to a `SyncScheduler`. The scheduler
//! runs until a `CancellationToken` is cancelled by the signal handler.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use freesync_core::config::Config;
use freesync_remote::HttpTransport;
use freesync_sync::{
    LocalVaultAdapter, ManualTrigger, SchedulerConfig, SyncEngine, SyncScheduler,
    TracingStatusReporter,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for `freesyncd`
#[derive(Debug, Parser)]
#[command(name = "freesyncd", version, about = "FreeSync background sync daemon")]
struct Args {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// DaemonService
// ============================================================================

/// Main daemon service that wires the sync engine and its scheduler
struct DaemonService {
    /// Application configuration loaded from YAML
    config: Config,
    /// Token for signalling graceful shutdown to all async tasks
    shutdown: CancellationToken,
}

impl DaemonService {
    fn new(config: Config, shutdown: CancellationToken) -> Self {
        Self { config, shutdown }
    }

    /// Builds the engine over the configured vault root
    ///
    /// The root directory is created if it does not exist yet, so a fresh
    /// machine can start by pulling the remote vault.
    async fn build_engine(&self, reporter: Arc<TracingStatusReporter>) -> Result<Arc<SyncEngine>> {
        let root = self.config.vault.resolved_root();
        if !root.is_dir() {
            info!(root = %root.display(), "Creating vault root");
            tokio::fs::create_dir_all(&root)
                .await
                .with_context(|| format!("Failed to create vault root {}", root.display()))?;
        }

        let engine = SyncEngine::new(
            Arc::new(LocalVaultAdapter::new(root)),
            Arc::new(HttpTransport::new()),
            reporter,
            self.config.remote.clone(),
            &self.config.vault.display_name(),
        );
        Ok(Arc::new(engine))
    }

    /// Runs the daemon's main loop until shutdown
    ///
    /// 1. Validates the configuration
    /// 2. Creates adapters, SyncEngine and SyncScheduler
    /// 3. Listens for SIGUSR1 "sync now" requests
    /// 4. Runs the scheduler (startup download, interval uploads, final upload)
    async fn run(&self) -> Result<()> {
        let errors = self.config.validate();
        if !errors.is_empty() {
            for err in &errors {
                error!(field = %err.field, message = %err.message, "Invalid configuration");
            }
            bail!("configuration has {} error(s)", errors.len());
        }

        let reporter = Arc::new(TracingStatusReporter::new());
        let engine = self.build_engine(reporter.clone()).await?;
        info!(
            vault_id = %engine.vault_id(),
            host = %self.config.remote.host,
            "Sync engine ready"
        );

        let (scheduler, trigger) = SyncScheduler::new(
            engine,
            reporter,
            SchedulerConfig::from_config(&self.config),
            self.shutdown.clone(),
        );

        tokio::spawn(manual_sync_signal(trigger, self.shutdown.clone()));

        scheduler.run().await;
        Ok(())
    }
}

// ============================================================================
// Signal handlers
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

/// Turns each SIGUSR1 into a manual sync request
#[cfg(unix)]
async fn manual_sync_signal(trigger: ManualTrigger, shutdown: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sig = match signal(SignalKind::user_defined1()) {
        Ok(sig) => sig,
        Err(e) => {
            warn!(error = %e, "Failed to install SIGUSR1 handler; manual sync disabled");
            return;
        }
    };

    loop {
        tokio::select! {
            received = sig.recv() => {
                if received.is_none() {
                    return;
                }
                info!("Received SIGUSR1");
                trigger.trigger();
            }
            _ = shutdown.cancelled() => return,
        }
    }
}

#[cfg(not(unix))]
async fn manual_sync_signal(_trigger: ManualTrigger, shutdown: CancellationToken) {
    shutdown.cancelled().await;
}

// ============================================================================
// Logging
// ============================================================================

/// Builds the log filter: `RUST_LOG` wins, otherwise the configured level
fn env_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
}

fn init_tracing(config: &Config) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(true);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(Config::default_path);
    let config = if config_path.exists() {
        Config::load(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        Config::default()
    };

    init_tracing(&config);
    info!(config_path = %config_path.display(), "FreeSync daemon starting (freesyncd)");

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(config, shutdown_token);
    let result = service.run().await;

    match &result {
        Ok(()) => info!("FreeSync daemon shut down gracefully"),
        Err(e) => error!(error = %e, "FreeSync daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
