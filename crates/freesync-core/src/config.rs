//! Configuration module for FreeSync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, saving, validation, defaults, and a builder pattern for
//! programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::vault_id;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for FreeSync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub vault: VaultConfig,
    pub status: StatusConfig,
    pub logging: LoggingConfig,
}

/// Remote endpoint settings.
///
/// A snapshot of this section is taken at the start of every sync pass.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the sync server.
    pub host: String,
    /// Sent verbatim as the bearer token.
    pub username: String,
    /// Stored for future authentication; never sent.
    pub password: String,
    /// Minutes between scheduled uploads.
    pub interval_minutes: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Local vault settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Root directory of the vault. A leading `~` is expanded at runtime.
    pub root: PathBuf,
    /// Display name the remote vault id is derived from.
    /// Defaults to the root directory's name.
    pub name: Option<String>,
}

/// Status display settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Seconds between "last synced" re-renders.
    pub refresh_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON lines instead of human-readable logs.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load() / save()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    ///
    /// Missing keys take their default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Write the configuration as YAML to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/freesync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("freesync")
            .join("config.yaml")
    }

    /// The remote vault id for the configured vault.
    pub fn vault_id(&self) -> String {
        vault_id(&self.vault.display_name())
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default server address.
pub const DEFAULT_HOST: &str = "http://127.0.0.1:6521";

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            username: String::new(),
            password: String::new(),
            interval_minutes: 5,
            timeout_secs: 60,
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("~/Vault"),
            name: None,
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self { refresh_secs: 60 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Section helpers
// ---------------------------------------------------------------------------

impl RemoteConfig {
    /// Time between scheduled uploads.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resource URL `{host}/vault/{vault_id}`.
    ///
    /// A path prefix on the host is kept: `http://h/api` resolves to
    /// `http://h/api/vault/{vault_id}`.
    pub fn vault_url(&self, vault_id: &str) -> Result<Url, url::ParseError> {
        let mut base = Url::parse(&self.host)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(&format!("vault/{}", vault_id))
    }
}

// The password must never reach logs.
impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let password = if self.password.is_empty() { "" } else { "***" };
        f.debug_struct("RemoteConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &password)
            .field("interval_minutes", &self.interval_minutes)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl VaultConfig {
    /// The vault root with a leading `~` expanded to the home directory.
    pub fn resolved_root(&self) -> PathBuf {
        match self.root.strip_prefix("~") {
            Ok(rest) => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join(rest),
            Err(_) => self.root.clone(),
        }
    }

    /// Display name of the vault: the configured name, or the root's folder name.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.resolved_root()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl StatusConfig {
    /// Time between "last synced" re-renders.
    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"remote.interval_minutes"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- remote ---
        match Url::parse(&self.remote.host) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(ValidationError {
                field: "remote.host".into(),
                message: format!("unsupported scheme '{}'; use http or https", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError {
                field: "remote.host".into(),
                message: format!("invalid URL '{}': {}", self.remote.host, e),
            }),
        }
        if self.remote.interval_minutes == 0 {
            errors.push(ValidationError {
                field: "remote.interval_minutes".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.remote.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "remote.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- vault ---
        // Check the root only when it does not start with `~` (tilde is expanded at runtime).
        let root_str = self.vault.root.to_string_lossy();
        if !root_str.starts_with('~') && !self.vault.root.is_dir() {
            errors.push(ValidationError {
                field: "vault.root".into(),
                message: format!("directory does not exist: {}", self.vault.root.display()),
            });
        }
        if self.vault_id().is_empty() {
            errors.push(ValidationError {
                field: "vault.name".into(),
                message: format!(
                    "'{}' yields an empty vault id; use at least one ASCII letter",
                    self.vault.display_name()
                ),
            });
        }

        // --- status ---
        if self.status.refresh_secs == 0 {
            errors.push(ValidationError {
                field: "status.refresh_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use freesync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .vault_root(PathBuf::from("/home/user/Notes"))
///     .remote_host("https://sync.example.com")
///     .remote_interval_minutes(10)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder pre-populated with default values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    // -- remote --

    pub fn remote_host(mut self, host: impl Into<String>) -> Self {
        self.config.remote.host = host.into();
        self
    }

    pub fn remote_username(mut self, username: impl Into<String>) -> Self {
        self.config.remote.username = username.into();
        self
    }

    pub fn remote_password(mut self, password: impl Into<String>) -> Self {
        self.config.remote.password = password.into();
        self
    }

    pub fn remote_interval_minutes(mut self, minutes: u64) -> Self {
        self.config.remote.interval_minutes = minutes;
        self
    }

    pub fn remote_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.remote.timeout_secs = seconds;
        self
    }

    // -- vault --

    pub fn vault_root(mut self, root: PathBuf) -> Self {
        self.config.vault.root = root;
        self
    }

    pub fn vault_name(mut self, name: impl Into<String>) -> Self {
        self.config.vault.name = Some(name.into());
        self
    }

    // -- status --

    pub fn status_refresh_secs(mut self, seconds: u64) -> Self {
        self.config.status.refresh_secs = seconds;
        self
    }

    // -- logging --

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    /// Consume the builder and return the configuration (no validation).
    pub fn build(self) -> Config {
        self.config
    }

    /// Consume the builder, validate, and return the configuration or errors.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let errors = self.config.validate();
        if errors.is_empty() {
            Ok(self.config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
