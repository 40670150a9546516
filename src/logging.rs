//! Logging
//!
//! `tracing` subscriber setup. Events go to an append-only log file through a
//! non-blocking writer; stdout is added when requested or in debug mode.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

static LOG_PATH: OnceCell<PathBuf> = OnceCell::new();

/// Logging setup options.
#[derive(Debug, Clone)]
pub struct LogConfig {
    level: String,
    log_dir: PathBuf,
    file_name: String,
    console: bool,
    debug_mode: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("."),
            file_name: "bot.log".to_string(),
            console: false,
            debug_mode: false,
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new()
            .with_level(&config.level)
            .with_log_dir(config.dir.clone())
            .with_file_name(&config.file)
            .with_console(config.console)
    }

    pub fn with_level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        self
    }

    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = dir;
        self
    }

    pub fn with_file_name(mut self, name: &str) -> Self {
        self.file_name = name.to_string();
        self
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// Debug mode forces `debug` level and console output.
    pub fn with_debug_mode(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        self
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(&self.file_name)
    }

    fn effective_level(&self) -> &str {
        if self.debug_mode { "debug" } else { &self.level }
    }
}

/// Install the global subscriber. Keep the returned guard alive for the life
/// of the process or buffered events are lost.
pub fn init_logging(config: LogConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to create log directory: {:?}", config.log_dir))?;

    let appender = tracing_appender::rolling::never(&config.log_dir, &config.file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.effective_level()));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    let console_layer = (config.console || config.debug_mode).then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    let _ = LOG_PATH.set(config.log_path());
    Ok(guard)
}

/// Path of the active log file, once logging is initialized.
pub fn get_log_path() -> Option<PathBuf> {
    LOG_PATH.get().cloned()
}

/// Delete `*.log*` files in `log_dir` not modified within `days` days.
pub fn cleanup_old_logs(log_dir: &Path, days: u64) -> Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let cutoff = SystemTime::now()
        .checked_sub(Duration::from_secs(days.saturating_mul(24 * 60 * 60)))
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut removed = 0;
    for entry in std::fs::read_dir(log_dir)
        .with_context(|| format!("Failed to read log directory: {:?}", log_dir))?
    {
        let entry = entry?;
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains(".log"));
        if !is_log || !path.is_file() {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        if modified < cutoff {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove old log: {:?}", path))?;
            removed += 1;
        }
    }

    Ok(removed)
}
