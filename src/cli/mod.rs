//! CLI Module
//!
//! Command-line interface for instarelay using Clap v4.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::logging::{self, LogConfig};

/// instarelay - relays Instagram posts into Telegram chats
#[derive(Parser, Debug)]
#[command(name = "instarelay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug mode (debug level, log to stdout as well)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Register the webhook and serve it until Ctrl-C (default)
    Serve,

    /// Validate configuration and print a summary
    Check,

    /// Show configuration
    Config {
        /// Show full configuration including secrets
        #[arg(short, long)]
        show_secrets: bool,
    },

    /// Log management operations
    Logs {
        #[command(subcommand)]
        operation: LogCommands,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum LogCommands {
    /// Show log file location and status
    Status,
    /// Clean up old log files
    Clean {
        /// Maximum age in days (default: 7)
        #[arg(short = 'a', long, default_value = "7")]
        days: u64,
    },
}

/// Main CLI entry point
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    let _guard = logging::init_logging(
        LogConfig::from_config(&config.logging).with_debug_mode(cli.debug),
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    if cli.debug {
        tracing::info!("Debug mode enabled");
    }

    match cli.command {
        None | Some(Commands::Serve) => commands::cmd_serve(&config).await,
        Some(Commands::Check) => commands::cmd_check(&config),
        Some(Commands::Config { show_secrets }) => commands::cmd_config(&config, show_secrets),
        Some(Commands::Logs { operation }) => commands::cmd_logs(&config, operation),
    }
}

/// Load configuration from file or defaults
fn load_config(config_path: Option<&str>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}
