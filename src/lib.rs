//! instarelay - Instagram to Telegram relay bot
//!
//! Allow-listed Telegram users send an Instagram post or reel link; the bot
//! fetches the post with a logged-in Instagram session and replies with its
//! videos, photos and caption.
//!
//! ## Quick Start
//!
//! ```bash
//! # Validate configuration
//! instarelay check
//!
//! # Register the webhook and serve it
//! instarelay serve
//! ```

pub mod channels;
pub mod cli;
pub mod config;
pub mod error;
pub mod instagram;
pub mod logging;
pub mod relay;
pub mod utils;

pub use error::RelayError;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
