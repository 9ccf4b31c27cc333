//! Sync command - Push the whole vault to the server
//!
//! Provides the `freesync sync` CLI command ("Sync now"), which:
//! 1. Loads configuration
//! 2. Creates the filesystem and HTTP adapters
//! 3. Runs one upload pass and displays the result

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::{build_engine, print_report, CommandContext};

/// Upload the whole vault
#[derive(Debug, Args)]
pub struct SyncCommand {}

impl SyncCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let config = ctx.load_config()?;
        info!(config_path = %ctx.config_path.display(), "Loaded configuration");

        let engine = build_engine(&config, false).await?;
        ctx.formatter()
            .info(&format!("Uploading vault to {}...", config.remote.host));

        let outcome = engine.upload().await.context("Upload failed")?;
        if let Some(report) = outcome.report() {
            print_report(ctx, engine.vault_id(), report);
        }
        Ok(())
    }
}
