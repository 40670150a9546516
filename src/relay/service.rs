//! Relay Service
//!
//! Runs one inbound chat message through the pipeline: allow-list, command or
//! URL classification, duplicate check, Instagram fetch into the scratch
//! directory, reply dispatch. Every business failure ends as a chat reply;
//! only failures to deliver those replies are returned to the caller.

use super::auth::{AllowList, NOT_AUTHORIZED};
use super::classify::{classify, Inbound, PostUrl, INVALID_URL};
use super::dedup::{DedupTable, ALREADY_PROCESSED};
use super::reply::{self, Replier};
use super::scratch::ScratchDir;
use crate::config::{Config, SecretString};
use crate::error::{RelayError, ReplyError};
use crate::instagram::InstagramApi;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

pub const WELCOME: &str = "Welcome! Send me an Instagram post URL to download its video and text.";

/// How a message was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Denied,
    Welcomed,
    InvalidUrl,
    Duplicate,
    Relayed { media: usize },
    Failed,
}

pub struct RelayService {
    allow: AllowList,
    dedup: DedupTable,
    scratch: ScratchDir,
    instagram: Arc<dyn InstagramApi>,
    username: String,
    password: SecretString,
}

impl RelayService {
    pub fn new(config: &Config, instagram: Arc<dyn InstagramApi>) -> Self {
        Self::from_parts(
            AllowList::new(config.telegram.allowed_users.iter().copied()),
            ScratchDir::new(config.scratch.dir.clone()),
            instagram,
            config.instagram.username.clone(),
            config.instagram.password.clone(),
        )
    }

    pub fn from_parts(
        allow: AllowList,
        scratch: ScratchDir,
        instagram: Arc<dyn InstagramApi>,
        username: String,
        password: SecretString,
    ) -> Self {
        Self {
            allow,
            dedup: DedupTable::new(),
            scratch,
            instagram,
            username,
            password,
        }
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    pub fn dedup(&self) -> &DedupTable {
        &self.dedup
    }

    /// Handle one text message from `user_id`.
    pub async fn handle_text(
        &self,
        user_id: i64,
        text: &str,
        replier: &dyn Replier,
    ) -> Result<Outcome, ReplyError> {
        let span = tracing::info_span!("relay", request_id = %Uuid::new_v4(), user_id);
        self.handle_text_inner(user_id, text, replier)
            .instrument(span)
            .await
    }

    async fn handle_text_inner(
        &self,
        user_id: i64,
        text: &str,
        replier: &dyn Replier,
    ) -> Result<Outcome, ReplyError> {
        if !self.allow.is_allowed(user_id) {
            tracing::warn!("Relay: rejected message from non-allowed user {}", user_id);
            replier.send_text(NOT_AUTHORIZED).await?;
            return Ok(Outcome::Denied);
        }

        let post = match classify(text) {
            Inbound::Command(name) => {
                tracing::info!("Relay: received command /{}", name);
                replier.send_text(WELCOME).await?;
                return Ok(Outcome::Welcomed);
            }
            Inbound::InvalidUrl => {
                tracing::info!("Relay: not a post URL");
                replier.send_text(INVALID_URL).await?;
                return Ok(Outcome::InvalidUrl);
            }
            Inbound::Post(post) => post,
        };

        if self.dedup.is_duplicate(user_id, &post.url).await {
            tracing::info!("Relay: duplicate submission of {}", post.url);
            replier.send_text(ALREADY_PROCESSED).await?;
            return Ok(Outcome::Duplicate);
        }

        tracing::info!("Relay: post shortcode {}", post.shortcode);
        match self.relay_post(&post, replier).await {
            Ok(media) => {
                self.dedup.record(user_id, &post.url).await;
                tracing::info!("Relay: delivered {} media file(s) for {}", media, post.shortcode);
                Ok(Outcome::Relayed { media })
            }
            Err(e) => {
                tracing::error!("Relay: failed to relay {}: {}", post.shortcode, e);
                replier.send_text(&e.user_message()).await?;
                Ok(Outcome::Failed)
            }
        }
    }

    async fn relay_post(&self, post: &PostUrl, replier: &dyn Replier) -> Result<usize, RelayError> {
        let session = self.instagram.login(&self.username, &self.password).await?;
        let resolved = self.instagram.resolve_post(&session, &post.shortcode).await?;

        // Held until the replies are out; dropping it empties the directory.
        let lease = self.scratch.lease().await.map_err(RelayError::Scratch)?;
        self.instagram
            .download_post(&session, &resolved, lease.path())
            .await?;

        reply::dispatch(lease.path(), resolved.caption.as_deref(), replier).await
    }
}
