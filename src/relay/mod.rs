//! Relay Pipeline
//!
//! Chat-platform-independent handling of inbound messages: who may use the
//! bot, what their text means, and how a post's media gets back to them.

pub mod auth;
pub mod classify;
pub mod dedup;
pub mod media;
pub mod reply;
pub mod scratch;
mod service;

pub use auth::AllowList;
pub use reply::Replier;
pub use scratch::{ScratchDir, ScratchLease};
pub use service::{Outcome, RelayService, WELCOME};
