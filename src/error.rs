//! Error types
//!
//! Typed failures for the relay pipeline. Every variant that can reach a chat
//! carries the exact text the sender sees via [`RelayError::user_message`].

use thiserror::Error;

/// Authentication failure against Instagram.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Bad credentials, please check your username and password.")]
    BadCredentials,

    #[error("Two-factor authentication is required. Please disable it for this account.")]
    TwoFactorRequired,

    #[error("{0}")]
    Unexpected(String),
}

/// Failure while resolving or downloading a post.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Instagram returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("failed to parse Instagram response: {0}")]
    Parse(String),

    #[error("post not found or media unavailable: {0}")]
    NotFound(String),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),
}

/// A chat reply could not be delivered.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ReplyError(pub String);

/// Anything that aborts handling of a single inbound message.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("login failed: {0}")]
    Login(#[from] LoginError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Media files not found.")]
    MediaNotFound,

    #[error("scratch directory error: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("failed to send reply: {0}")]
    Reply(#[from] ReplyError),
}

impl RelayError {
    /// Text sent back to the chat for this failure.
    pub fn user_message(&self) -> String {
        match self {
            RelayError::Login(e) => format!("An error occurred: {}", e),
            RelayError::Fetch(e) => format!("An error occurred: {}", e),
            RelayError::MediaNotFound => "An error occurred: Media files not found.".to_string(),
            RelayError::Scratch(e) => format!("An error occurred: {}", e),
            RelayError::Reply(e) => format!("An error occurred: {}", e),
        }
    }
}
