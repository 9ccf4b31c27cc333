//! CLI subcommands and the wiring they share

pub mod completions;
pub mod config;
pub mod pull;
pub mod sync;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use freesync_core::config::Config;
use freesync_core::domain::SyncReport;
use freesync_remote::HttpTransport;
use freesync_sync::{LocalVaultAdapter, SyncEngine, TracingStatusReporter};

use crate::output::{format_bytes, format_duration_ms, get_formatter, plural, OutputFormat, OutputFormatter};

/// Settings every command runs with
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub format: OutputFormat,
    /// Config file in use (`--config` or the default location)
    pub config_path: PathBuf,
}

impl CommandContext {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.is_json())
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Loads the config file, or the defaults when there is none
    ///
    /// A file that exists but does not parse is an error.
    pub fn load_config(&self) -> Result<Config> {
        if self.config_path.exists() {
            Config::load(&self.config_path).with_context(|| {
                format!("Failed to load config from {}", self.config_path.display())
            })
        } else {
            Ok(Config::default())
        }
    }
}

/// Validates everything a one-shot pass needs except the vault root
fn check_config(config: &Config) -> Result<()> {
    let errors: Vec<String> = config
        .validate()
        .into_iter()
        .filter(|e| e.field != "vault.root")
        .map(|e| e.to_string())
        .collect();
    if !errors.is_empty() {
        bail!("invalid configuration: {}", errors.join("; "));
    }
    Ok(())
}

/// Wires the filesystem and HTTP adapters into an engine
///
/// With `create_root`, a missing vault root is created (pulling into a new
/// vault); otherwise it is an error.
pub async fn build_engine(config: &Config, create_root: bool) -> Result<SyncEngine> {
    check_config(config)?;

    let root = config.vault.resolved_root();
    if !root.is_dir() {
        if !create_root {
            bail!("vault root does not exist: {}", root.display());
        }
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create vault root {}", root.display()))?;
    }

    Ok(SyncEngine::new(
        Arc::new(LocalVaultAdapter::new(root)),
        Arc::new(HttpTransport::new()),
        Arc::new(TracingStatusReporter::new()),
        config.remote.clone(),
        &config.vault.display_name(),
    ))
}

/// Prints the summary of a finished pass
pub fn print_report(ctx: &CommandContext, vault_id: &str, report: &SyncReport) {
    let formatter = ctx.formatter();
    if ctx.is_json() {
        let json = serde_json::json!({
            "success": true,
            "vault_id": vault_id,
            "direction": report.direction,
            "files": report.files,
            "bytes": report.bytes,
            "duration_ms": report.duration_ms,
            "finished_at": report.finished_at,
        });
        formatter.print_json(&json);
    } else {
        formatter.success(&format!(
            "Sync complete! ({} in {})",
            report.direction,
            format_duration_ms(report.duration_ms)
        ));
        formatter.info(&format!("Vault: {}", vault_id));
        formatter.info(&format!(
            "Files: {} file{} ({})",
            report.files,
            plural(report.files),
            format_bytes(report.bytes)
        ));
    }
}

#[cfg(test)]
mod tests {
    use freesync_core::config::ConfigBuilder;

    use super::*;

    #[tokio::test]
    async fn test_build_engine_requires_root_for_upload() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ConfigBuilder::new()
            .vault_root(dir.path().join("missing"))
            .vault_name("notes")
            .build();

        let err = build_engine(&config, false).await.unwrap_err();
        assert!(err.to_string().contains("vault root does not exist"));
    }

    #[tokio::test]
    async fn test_build_engine_creates_root_for_download() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("new-vault");
        let config = ConfigBuilder::new()
            .vault_root(root.clone())
            .vault_name("notes")
            .build();

        let engine = build_engine(&config, true).await.unwrap();
        assert!(root.is_dir());
        assert_eq!(engine.vault_id(), "notes");
    }

    #[tokio::test]
    async fn test_build_engine_rejects_invalid_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ConfigBuilder::new()
            .vault_root(dir.path().to_path_buf())
            .remote_host("ftp://example.com")
            .build();

        let err = build_engine(&config, false).await.unwrap_err();
        assert!(err.to_string().contains("remote.host"));
    }

    #[test]
    fn test_load_config_defaults_when_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = CommandContext {
            format: OutputFormat::Human,
            config_path: dir.path().join("config.yaml"),
        };
        assert_eq!(ctx.load_config().unwrap(), Config::default());
    }

    #[test]
    fn test_load_config_fails_on_garbage() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "remote: [not, a, map").unwrap();
        let ctx = CommandContext {
            format: OutputFormat::Json,
            config_path: path,
        };
        assert!(ctx.load_config().is_err());
    }
}
