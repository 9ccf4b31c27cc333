//! Pull command - Replace local copies with the server's vault
//!
//! Provides the `freesync pull` CLI command, which runs one download pass.
//! Every file on the server overwrites its local copy; local files the
//! server does not have are left alone.

use anyhow::{Context, Result};
use clap::Args;
use freesync_core::SyncError;
use tracing::info;

use super::{build_engine, print_report, CommandContext};

/// Download the whole vault, overwriting local copies
#[derive(Debug, Args)]
pub struct PullCommand {}

impl PullCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let config = ctx.load_config()?;
        info!(config_path = %ctx.config_path.display(), "Loaded configuration");

        let engine = build_engine(&config, true).await?;
        let formatter = ctx.formatter();
        formatter.info(&format!("Downloading vault from {}...", config.remote.host));

        match engine.download().await {
            Ok(outcome) => {
                if let Some(report) = outcome.report() {
                    print_report(ctx, engine.vault_id(), report);
                }
                Ok(())
            }
            Err(err) => {
                if let SyncError::PartiallyApplied { written, total, .. } = &err {
                    formatter.warn(&format!(
                        "{} of {} files were written before the failure and were not rolled back",
                        written, total
                    ));
                }
                Err(err).context("Download failed")
            }
        }
    }
}
