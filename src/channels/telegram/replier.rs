//! Replies to one Telegram message, quoting it.

use crate::error::ReplyError;
use crate::relay::Replier;
use async_trait::async_trait;
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId, ReplyParameters};

pub struct TelegramReplier {
    bot: Bot,
    chat_id: ChatId,
    reply_to: MessageId,
}

impl TelegramReplier {
    pub fn new(bot: Bot, chat_id: ChatId, reply_to: MessageId) -> Self {
        Self {
            bot,
            chat_id,
            reply_to,
        }
    }

    fn reply_parameters(&self) -> ReplyParameters {
        ReplyParameters::new(self.reply_to)
    }
}

fn send_failed(what: &str, e: teloxide::RequestError) -> ReplyError {
    ReplyError(format!("failed to send {}: {}", what, e))
}

#[async_trait]
impl Replier for TelegramReplier {
    async fn send_text(&self, text: &str) -> Result<(), ReplyError> {
        self.bot
            .send_message(self.chat_id, text)
            .reply_parameters(self.reply_parameters())
            .await
            .map_err(|e| send_failed("message", e))?;
        Ok(())
    }

    async fn send_video(&self, path: &Path) -> Result<(), ReplyError> {
        tracing::debug!("Telegram: uploading video {:?} to chat {}", path, self.chat_id.0);
        self.bot
            .send_video(self.chat_id, InputFile::file(path))
            .reply_parameters(self.reply_parameters())
            .await
            .map_err(|e| send_failed("video", e))?;
        Ok(())
    }

    async fn send_photo(&self, path: &Path) -> Result<(), ReplyError> {
        tracing::debug!("Telegram: uploading photo {:?} to chat {}", path, self.chat_id.0);
        self.bot
            .send_photo(self.chat_id, InputFile::file(path))
            .reply_parameters(self.reply_parameters())
            .await
            .map_err(|e| send_failed("photo", e))?;
        Ok(())
    }
}
