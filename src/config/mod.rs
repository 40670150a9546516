//! Configuration Module
//!
//! Handles application configuration loading, validation, and secret handling.

pub mod secrets;
mod types;

pub use secrets::SecretString;
pub use types::{
    parse_allowed_users, Config, InstagramConfig, LoggingConfig, ScratchConfig, ServerConfig,
    TelegramConfig,
};
