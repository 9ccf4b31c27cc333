//! Config command - View and manage FreeSync configuration
//!
//! Provides the `freesync config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON) with the password redacted
//! 2. Writes a fresh configuration file from flags
//! 3. Sets individual configuration values via dot-notation keys
//! 4. Validates the configuration file and reports errors

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use freesync_core::config::{Config, ConfigBuilder};
use tracing::info;

use super::CommandContext;

const REDACTED: &str = "********";

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Write a new configuration file
    Init {
        /// Server address, e.g. http://127.0.0.1:6521
        #[arg(long)]
        host: Option<String>,
        /// Account name sent as the bearer credential
        #[arg(long)]
        username: Option<String>,
        /// Stored for the account; never sent to the server
        #[arg(long)]
        password: Option<String>,
        /// Minutes between automatic uploads
        #[arg(long)]
        interval: Option<u64>,
        /// Vault root directory
        #[arg(long)]
        root: Option<PathBuf>,
        /// Vault name (defaults to the root directory's name)
        #[arg(long)]
        name: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "remote.interval_minutes")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx),
            ConfigCommand::Init {
                host,
                username,
                password,
                interval,
                root,
                name,
                force,
            } => {
                let mut builder = ConfigBuilder::new();
                if let Some(host) = host {
                    builder = builder.remote_host(host.clone());
                }
                if let Some(username) = username {
                    builder = builder.remote_username(username.clone());
                }
                if let Some(password) = password {
                    builder = builder.remote_password(password.clone());
                }
                if let Some(interval) = interval {
                    builder = builder.remote_interval_minutes(*interval);
                }
                if let Some(root) = root {
                    builder = builder.vault_root(root.clone());
                }
                if let Some(name) = name {
                    builder = builder.vault_name(name.clone());
                }
                self.execute_init(ctx, builder.build(), *force)
            }
            ConfigCommand::Set { key, value } => self.execute_set(ctx, key, value),
            ConfigCommand::Validate => self.execute_validate(ctx),
            ConfigCommand::Path => {
                let formatter = ctx.formatter();
                if ctx.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "config_path": ctx.config_path.display().to_string(),
                        "exists": ctx.config_path.exists(),
                    }));
                } else {
                    println!("{}", ctx.config_path.display());
                }
                Ok(())
            }
        }
    }

    /// Show current configuration
    fn execute_show(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = redacted(ctx.load_config()?);

        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        let endpoint = config
            .remote
            .vault_url(&config.vault_id())
            .map(|u| u.to_string())
            .unwrap_or_else(|e| format!("<invalid: {}>", e));

        if ctx.is_json() {
            let json = serde_json::json!({
                "config_path": ctx.config_path.display().to_string(),
                "vault_id": config.vault_id(),
                "endpoint": endpoint,
                "config": serde_json::to_value(&config)
                    .context("Failed to serialize configuration to JSON")?,
            });
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
            formatter.info(&format!("Vault id: {}", config.vault_id()));
            formatter.info(&format!("Endpoint: {}", endpoint));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    fn execute_init(&self, ctx: &CommandContext, config: Config, force: bool) -> Result<()> {
        let formatter = ctx.formatter();
        let path = &ctx.config_path;

        if path.exists() && !force {
            bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }

        let errors = settable_errors(&config);
        if !errors.is_empty() {
            bail!("invalid configuration: {}", errors.join("; "));
        }

        config
            .save(path)
            .with_context(|| format!("Failed to write configuration to {}", path.display()))?;
        info!(config_path = %path.display(), "Wrote configuration");

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "config_path": path.display().to_string(),
                "vault_id": config.vault_id(),
            }));
        } else {
            formatter.success(&format!("Wrote {}", path.display()));
            formatter.info(&format!("Vault id: {}", config.vault_id()));
        }
        Ok(())
    }

    /// Set a configuration value using dot-notation
    fn execute_set(&self, ctx: &CommandContext, key: &str, value: &str) -> Result<()> {
        let formatter = ctx.formatter();
        let mut config = ctx.load_config()?;

        let shown = if key == "remote.password" { REDACTED } else { value };
        info!(key = %key, value = %shown, "Setting configuration value");

        if let Err(e) = apply_config_value(&mut config, key, value) {
            if !ctx.is_json() {
                formatter.info("Supported keys:");
                for (key, about) in SUPPORTED_KEYS {
                    formatter.info(&format!("  {:<24} - {}", key, about));
                }
            }
            return Err(e);
        }

        let errors = settable_errors(&config);
        if !errors.is_empty() {
            bail!("Invalid value for '{}': {}", key, errors.join("; "));
        }

        config.save(&ctx.config_path).with_context(|| {
            format!("Failed to write configuration to {}", ctx.config_path.display())
        })?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "value": shown,
                "config_path": ctx.config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Set {} = {}", key, shown));
            formatter.info(&format!("Saved to {}", ctx.config_path.display()));
        }
        Ok(())
    }

    /// Validate configuration file
    ///
    /// Returns an error when the file is missing, unparsable, or invalid so
    /// the exit status reflects the result.
    fn execute_validate(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let path = &ctx.config_path;

        if !path.exists() {
            bail!("Configuration file not found at {}", path.display());
        }
        let config = Config::load(path)
            .with_context(|| format!("Failed to parse configuration {}", path.display()))?;

        info!(config_path = %path.display(), "Validating configuration");
        let errors = config.validate();

        if ctx.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", path.display()));
        } else {
            formatter.info(&format!("File: {}", path.display()));
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        if !errors.is_empty() {
            bail!(
                "Configuration has {} error{}",
                errors.len(),
                crate::output::plural(errors.len())
            );
        }
        Ok(())
    }
}

const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("remote.host", "Server address"),
    ("remote.username", "Account name"),
    ("remote.password", "Account password (stored only)"),
    ("remote.interval_minutes", "Minutes between uploads"),
    ("remote.timeout_secs", "Request timeout in seconds"),
    ("vault.root", "Vault root directory"),
    ("vault.name", "Vault name, \"none\" to use the root's name"),
    ("status.refresh_secs", "Seconds between status refreshes"),
    ("logging.level", "trace|debug|info|warn|error"),
    ("logging.json", "true|false"),
];

/// Validation errors that block saving
///
/// The vault root may legitimately not exist yet (a pull creates it).
fn settable_errors(config: &Config) -> Vec<String> {
    config
        .validate()
        .into_iter()
        .filter(|e| e.field != "vault.root")
        .map(|e| e.to_string())
        .collect()
}

fn redacted(mut config: Config) -> Config {
    if !config.remote.password.is_empty() {
        config.remote.password = REDACTED.to_string();
    }
    config
}

/// Apply a dot-notation key/value pair to a Config struct
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        // --- remote ---
        "remote.host" => {
            config.remote.host = value.to_string();
        }
        "remote.username" => {
            config.remote.username = value.to_string();
        }
        "remote.password" => {
            config.remote.password = value.to_string();
        }
        "remote.interval_minutes" => {
            config.remote.interval_minutes = value
                .parse::<u64>()
                .context("Expected a positive integer for remote.interval_minutes")?;
        }
        "remote.timeout_secs" => {
            config.remote.timeout_secs = value
                .parse::<u64>()
                .context("Expected a positive integer for remote.timeout_secs")?;
        }

        // --- vault ---
        "vault.root" => {
            config.vault.root = PathBuf::from(value);
        }
        "vault.name" => {
            config.vault.name = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.to_string())
            };
        }

        // --- status ---
        "status.refresh_secs" => {
            config.status.refresh_secs = value
                .parse::<u64>()
                .context("Expected a positive integer for status.refresh_secs")?;
        }

        // --- logging ---
        "logging.level" => {
            config.logging.level = value.to_string();
        }
        "logging.json" => {
            config.logging.json = value
                .parse::<bool>()
                .context("Expected true or false for logging.json")?;
        }

        _ => {
            bail!("Unknown configuration key: '{}'", key);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    fn ctx_at(path: PathBuf) -> CommandContext {
        CommandContext {
            format: OutputFormat::Json,
            config_path: path,
        }
    }

    #[test]
    fn test_apply_remote_host() {
        let mut config = Config::default();
        apply_config_value(&mut config, "remote.host", "https://sync.example.com").unwrap();
        assert_eq!(config.remote.host, "https://sync.example.com");
    }

    #[test]
    fn test_apply_remote_interval() {
        let mut config = Config::default();
        apply_config_value(&mut config, "remote.interval_minutes", "15").unwrap();
        assert_eq!(config.remote.interval_minutes, 15);
    }

    #[test]
    fn test_apply_remote_interval_rejects_text() {
        let mut config = Config::default();
        let err = apply_config_value(&mut config, "remote.interval_minutes", "soon").unwrap_err();
        assert!(err.to_string().contains("remote.interval_minutes"));
    }

    #[test]
    fn test_apply_vault_name_none_clears() {
        let mut config = Config::default();
        apply_config_value(&mut config, "vault.name", "Work").unwrap();
        assert_eq!(config.vault.name.as_deref(), Some("Work"));
        apply_config_value(&mut config, "vault.name", "none").unwrap();
        assert!(config.vault.name.is_none());
    }

    #[test]
    fn test_apply_logging_json() {
        let mut config = Config::default();
        apply_config_value(&mut config, "logging.json", "true").unwrap();
        assert!(config.logging.json);
        assert!(apply_config_value(&mut config, "logging.json", "yes").is_err());
    }

    #[test]
    fn test_apply_unknown_key() {
        let mut config = Config::default();
        let err = apply_config_value(&mut config, "remote.port", "80").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
    }

    #[test]
    fn test_redacted_hides_password_only_when_set() {
        let config = ConfigBuilder::new().remote_password("hunter2").build();
        assert_eq!(redacted(config).remote.password, REDACTED);
        assert_eq!(redacted(Config::default()).remote.password, "");
    }

    #[tokio::test]
    async fn test_set_writes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("freesync").join("config.yaml");
        let ctx = ctx_at(path.clone());

        ConfigCommand::Set {
            key: "remote.username".into(),
            value: "alice".into(),
        }
        .execute(&ctx)
        .await
        .unwrap();

        let saved = Config::load(&path).unwrap();
        assert_eq!(saved.remote.username, "alice");
    }

    #[tokio::test]
    async fn test_set_refuses_invalid_value() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let ctx = ctx_at(path.clone());

        let err = ConfigCommand::Set {
            key: "remote.interval_minutes".into(),
            value: "0".into(),
        }
        .execute(&ctx)
        .await
        .unwrap_err();

        assert!(err.to_string().contains("remote.interval_minutes"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite_without_force() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "remote:\n  username: bob\n").unwrap();
        let ctx = ctx_at(path.clone());

        let init = |force| ConfigCommand::Init {
            host: None,
            username: Some("alice".into()),
            password: None,
            interval: Some(10),
            root: Some(dir.path().to_path_buf()),
            name: Some("Notes".into()),
            force,
        };

        assert!(init(false).execute(&ctx).await.is_err());
        assert_eq!(Config::load(&path).unwrap().remote.username, "bob");

        init(true).execute(&ctx).await.unwrap();
        let saved = Config::load(&path).unwrap();
        assert_eq!(saved.remote.username, "alice");
        assert_eq!(saved.remote.interval_minutes, 10);
        assert_eq!(saved.vault_id(), "notes");
    }

    #[tokio::test]
    async fn test_validate_fails_for_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = ctx_at(dir.path().join("absent.yaml"));
        let err = ConfigCommand::Validate.execute(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_validate_reports_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let config = ConfigBuilder::new()
            .vault_root(dir.path().to_path_buf())
            .status_refresh_secs(0)
            .build();
        config.save(&path).unwrap();

        let err = ConfigCommand::Validate
            .execute(&ctx_at(path))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Configuration has 1 error");
    }
}
