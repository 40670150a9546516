//! Telegram Bot Integration
//!
//! Receives updates over a webhook, runs text messages through the relay,
//! and replies in the originating chat.

mod bot;
pub(crate) mod handler;
mod replier;
pub mod webhook;

pub use bot::run;
pub use handler::TelegramHandler;
pub use replier::TelegramReplier;
pub use webhook::UpdateProcessor;
