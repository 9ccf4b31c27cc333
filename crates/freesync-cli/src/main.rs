//! FreeSync CLI - Command-line interface for FreeSync
//!
//! Provides commands for:
//! - Uploading the vault on demand ("Sync now")
//! - Pulling the remote vault
//! - Viewing and editing configuration
//! - Generating shell completions

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use freesync_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    completions::CompletionsCommand, config::ConfigCommand, pull::PullCommand,
    sync::SyncCommand, CommandContext,
};
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(name = "freesync", version, about = "Whole-vault sync with a FreeSync server")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload the whole vault now
    Sync(SyncCommand),
    /// Download the whole vault, overwriting local copies
    Pull(PullCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Log filter: `RUST_LOG` wins, then `-v`, then the configured level
fn env_filter(verbose: u8, config_path: &std::path::Path) -> EnvFilter {
    let level = match verbose {
        0 => Config::load_or_default(config_path).logging.level,
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

async fn run(cli: Cli, ctx: CommandContext) -> Result<()> {
    match cli.command {
        Commands::Sync(cmd) => cmd.execute(&ctx).await,
        Commands::Pull(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
        Commands::Completions(cmd) => cmd.execute(&ctx).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    // Logs go to stderr so --json output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(cli.verbose, &config_path))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let ctx = CommandContext {
        format,
        config_path,
    };

    match run(cli, ctx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            get_formatter(matches!(format, OutputFormat::Json)).error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["freesync", "sync", "--json", "-vv", "--config", "/tmp/c.yaml"]);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.yaml")));
        assert!(matches!(cli.command, Commands::Sync(_)));
    }

    #[test]
    fn test_config_set_parses_key_and_value() {
        let cli = Cli::parse_from(["freesync", "config", "set", "remote.host", "http://h:1"]);
        match cli.command {
            Commands::Config(ConfigCommand::Set { key, value }) => {
                assert_eq!(key, "remote.host");
                assert_eq!(value, "http://h:1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_pull_takes_no_arguments() {
        assert!(Cli::try_parse_from(["freesync", "pull", "extra"]).is_err());
    }
}
