//! CLI command handlers.

use anyhow::Result;

use super::LogCommands;
use crate::config::Config;
use crate::logging;

/// Validate configuration, then run the webhook server until Ctrl-C.
pub(crate) async fn cmd_serve(config: &Config) -> Result<()> {
    config.validate()?;
    tracing::info!("instarelay {} starting", crate::VERSION);
    crate::channels::telegram::run(config).await?;
    tracing::info!("instarelay stopped");
    Ok(())
}

pub(crate) fn cmd_check(config: &Config) -> Result<()> {
    config.validate()?;

    println!("Configuration OK\n");
    println!(
        "Webhook URL: {}",
        config.telegram.webhook_url.as_deref().unwrap_or("-")
    );
    println!(
        "Listening on: {}:{}{}",
        config.server.bind, config.server.port, config.server.path
    );
    println!("Allowed users: {}", config.telegram.allowed_users.len());
    println!("Instagram account: {}", config.instagram.username);
    println!("Scratch directory: {}", config.scratch.dir.display());
    println!(
        "Log file: {}",
        config.logging.dir.join(&config.logging.file).display()
    );
    Ok(())
}

/// Show configuration
pub(crate) fn cmd_config(config: &Config, show_secrets: bool) -> Result<()> {
    let rendered = if show_secrets {
        config.to_toml()?
    } else {
        config.redacted().to_toml()?
    };
    println!("{}", rendered);

    if !show_secrets {
        println!("# Use --show-secrets to display the bot token and password");
    }
    Ok(())
}

pub(crate) fn cmd_logs(config: &Config, operation: LogCommands) -> Result<()> {
    let log_dir = &config.logging.dir;

    match operation {
        LogCommands::Status => {
            let log_path = logging::get_log_path()
                .unwrap_or_else(|| log_dir.join(&config.logging.file));
            println!("Log file: {}", log_path.display());

            match std::fs::metadata(&log_path) {
                Ok(metadata) => {
                    println!("Size: {:.2} KB", metadata.len() as f64 / 1024.0);
                    if let Ok(modified) = metadata.modified() {
                        let modified: chrono::DateTime<chrono::Local> = modified.into();
                        println!("Last write: {}", modified.format("%Y-%m-%d %H:%M:%S"));
                    }
                }
                Err(_) => println!("Status: no log file yet"),
            }
            Ok(())
        }

        LogCommands::Clean { days } => {
            println!("Cleaning up log files older than {} days...", days);

            match logging::cleanup_old_logs(log_dir, days) {
                Ok(0) => println!("No old log files to remove"),
                Ok(removed) => println!("Removed {} old log file(s)", removed),
                Err(e) => println!("Error cleaning logs: {}", e),
            }
            Ok(())
        }
    }
}
