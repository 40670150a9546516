//! Instagram Integration
//!
//! Logs in, resolves posts by shortcode, and downloads their media into a
//! target directory. [`InstagramApi`] is the seam the relay talks to;
//! [`InstagramClient`] is the HTTP implementation.

mod client;

pub use client::InstagramClient;

use crate::config::SecretString;
use crate::error::{FetchError, LoginError};
use crate::relay::media::MediaKind;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};

/// An authenticated Instagram web session. Created per request, never shared.
#[derive(Clone, Default)]
pub struct Session {
    pub username: String,
    pub(crate) csrf_token: String,
    pub(crate) cookie_header: String,
}

impl Session {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// One downloadable asset of a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub url: String,
}

/// A resolved post: its caption and the assets to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub shortcode: String,
    pub caption: Option<String>,
    pub owner: Option<String>,
    pub items: Vec<MediaItem>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstagramApi: Send + Sync {
    async fn login(&self, username: &str, password: &SecretString) -> Result<Session, LoginError>;

    async fn resolve_post(&self, session: &Session, shortcode: &str) -> Result<Post, FetchError>;

    /// Write every media item of `post` into `target`; returns the files written.
    async fn download_post(
        &self,
        session: &Session,
        post: &Post,
        target: &Path,
    ) -> Result<Vec<PathBuf>, FetchError>;
}
