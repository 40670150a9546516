//! Configuration types, defaults, loading, and validation.

use super::secrets::SecretString;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Telegram bot and webhook settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Instagram account used to fetch posts
    #[serde(default)]
    pub instagram: InstagramConfig,

    /// Local HTTP listener for the webhook
    #[serde(default)]
    pub server: ServerConfig,

    /// Staging directory for downloaded media
    #[serde(default)]
    pub scratch: ScratchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token
    #[serde(default)]
    pub token: SecretString,

    /// Public URL Telegram posts updates to
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Telegram user IDs permitted to use the bot
    #[serde(default)]
    pub allowed_users: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramConfig {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: SecretString,

    /// Instagram web origin (overridable for testing)
    #[serde(default = "default_instagram_base_url")]
    pub base_url: String,

    /// GraphQL document id for shortcode lookups (Instagram rotates these)
    #[serde(default = "default_graphql_doc_id")]
    pub graphql_doc_id: String,
}

fn default_instagram_base_url() -> String {
    "https://www.instagram.com".to_string()
}

fn default_graphql_doc_id() -> String {
    "8845758582119845".to_string()
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: SecretString::default(),
            base_url: default_instagram_base_url(),
            graphql_doc_id: default_graphql_doc_id(),
        }
    }
}

/// Webhook HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: "127.0.0.1")
    #[serde(default = "default_server_bind")]
    pub bind: String,

    /// Listen port (default: 5001)
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Route the webhook is served on (default: "/bot1/")
    #[serde(default = "default_webhook_path")]
    pub path: String,
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    5001
}

fn default_webhook_path() -> String {
    "/bot1/".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_server_bind(),
            port: default_server_port(),
            path: default_webhook_path(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address: {}:{}", self.bind, self.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScratchConfig {
    #[serde(default = "default_scratch_dir")]
    pub dir: PathBuf,
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("temp")
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            dir: default_scratch_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory holding the log file
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    /// Log file name, appended to across restarts
    #[serde(default = "default_log_file")]
    pub file: String,

    /// Also log to stdout
    #[serde(default)]
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
            file: default_log_file(),
            console: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_file() -> String {
    "bot.log".to_string()
}

fn read_table(path: &Path) -> Result<toml::Table> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    toml::from_str(&contents).with_context(|| format!("Failed to parse config file: {:?}", path))
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Parse a comma-separated list of Telegram user IDs.
pub fn parse_allowed_users(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("Invalid Telegram user ID: {:?}", s))
        })
        .collect()
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. Default values
    /// 2. System config: ~/.config/instarelay/config.toml
    /// 3. Local config: ./instarelay.toml
    /// 4. Environment variables
    ///
    /// Files are merged key by key, so a later file only replaces the keys it
    /// sets.
    pub fn load() -> Result<Self> {
        tracing::debug!("Loading configuration...");

        let mut files = Vec::new();
        if let Some(system_config_path) = Self::system_config_path()
            && system_config_path.exists()
        {
            tracing::debug!("Loading system config from: {:?}", system_config_path);
            files.push(system_config_path);
        }

        let local_config_path = Self::local_config_path();
        if local_config_path.exists() {
            tracing::debug!("Loading local config from: {:?}", local_config_path);
            files.push(local_config_path);
        }

        let config = Self::apply_env_overrides(Self::load_layered(&files)?)?;

        tracing::debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply env overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from custom path: {:?}", path);

        if !path.exists() {
            anyhow::bail!("Config file not found: {:?}", path);
        }
        let config = Self::load_layered(&[path])?;
        Self::apply_env_overrides(config)
    }

    /// Get the system config path: ~/.config/instarelay/config.toml
    pub fn system_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("instarelay").join("config.toml"))
    }

    /// Get the local config path: ./instarelay.toml
    pub(crate) fn local_config_path() -> PathBuf {
        PathBuf::from("./instarelay.toml")
    }

    /// Merge TOML files in order, later keys winning; whatever no file sets
    /// takes its default.
    pub(crate) fn load_layered<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut merged = toml::Table::new();
        for path in paths {
            merge_tables(&mut merged, read_table(path.as_ref())?);
        }

        toml::Value::Table(merged)
            .try_into()
            .context("Failed to interpret merged configuration")
    }

    fn apply_env_overrides(config: Self) -> Result<Self> {
        Self::apply_overrides_from(config, |key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup. Split out so tests need not touch
    /// the process environment.
    pub(crate) fn apply_overrides_from<F>(mut config: Self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("INSTA_TELEGRAM_BOT_TOKEN") {
            config.telegram.token = SecretString::new(token);
        }
        if let Some(url) = lookup("WEBHOOK_URL_BOT") {
            config.telegram.webhook_url = Some(url);
        }
        if let Some(ids) = lookup("ALLOWED_USER_ID_BOT") {
            config.telegram.allowed_users = parse_allowed_users(&ids)?;
        }

        if let Some(username) = lookup("INSTAGRAM_USERNAME") {
            config.instagram.username = username;
        }
        if let Some(password) = lookup("INSTAGRAM_PASSWORD") {
            config.instagram.password = SecretString::new(password);
        }
        if let Some(doc_id) = lookup("INSTAGRAM_DOC_ID") {
            config.instagram.graphql_doc_id = doc_id;
        }

        if let Some(bind) = lookup("INSTARELAY_BIND") {
            config.server.bind = bind;
        }
        if let Some(port) = lookup("INSTARELAY_PORT") {
            config.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid INSTARELAY_PORT: {:?}", port))?;
        }
        if let Some(path) = lookup("INSTARELAY_WEBHOOK_PATH") {
            config.server.path = path;
        }

        if let Some(dir) = lookup("INSTARELAY_SCRATCH_DIR") {
            config.scratch.dir = PathBuf::from(dir);
        }

        if let Some(level) = lookup("INSTARELAY_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(dir) = lookup("INSTARELAY_LOG_DIR") {
            config.logging.dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Reject configurations the bot cannot run with.
    pub fn validate(&self) -> Result<()> {
        tracing::debug!("Validating configuration...");

        if self.telegram.token.is_empty() {
            anyhow::bail!("Telegram bot token is not set (INSTA_TELEGRAM_BOT_TOKEN)");
        }

        let webhook_url = self
            .telegram
            .webhook_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .context("Webhook URL is not set (WEBHOOK_URL_BOT)")?;
        let parsed = url::Url::parse(webhook_url)
            .with_context(|| format!("Invalid webhook URL: {}", webhook_url))?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            anyhow::bail!("Webhook URL must be http(s): {}", webhook_url);
        }

        if self.telegram.allowed_users.is_empty() {
            anyhow::bail!("No allowed Telegram users configured (ALLOWED_USER_ID_BOT)");
        }

        if self.instagram.username.trim().is_empty() {
            anyhow::bail!("Instagram username is not set (INSTAGRAM_USERNAME)");
        }
        if self.instagram.password.is_empty() {
            anyhow::bail!("Instagram password is not set (INSTAGRAM_PASSWORD)");
        }
        url::Url::parse(&self.instagram.base_url)
            .with_context(|| format!("Invalid Instagram base URL: {}", self.instagram.base_url))?;

        if !self.server.path.starts_with('/') {
            anyhow::bail!("Webhook path must start with '/': {}", self.server.path);
        }
        self.server.socket_addr()?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Copy with every secret replaced by a placeholder.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.telegram.token = self.telegram.token.redacted();
        copy.instagram.password = self.instagram.password.redacted();
        copy
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }
}
