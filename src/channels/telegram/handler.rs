//! Telegram Update Handler
//!
//! Turns decoded updates into relay calls. Only text messages with a known
//! sender are handled; everything else is acknowledged and dropped.

use super::replier::TelegramReplier;
use super::webhook::UpdateProcessor;
use crate::relay::RelayService;
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{MessageId, UpdateKind};

/// The parts of a text message the relay needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InboundText {
    pub user_id: i64,
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: String,
}

impl InboundText {
    pub(crate) fn from_update(update: &Update) -> Option<Self> {
        let UpdateKind::Message(msg) = &update.kind else {
            return None;
        };
        let user = msg.from.as_ref()?;
        let text = msg.text()?;

        Some(Self {
            user_id: user.id.0 as i64,
            chat_id: msg.chat.id,
            message_id: msg.id,
            text: text.to_string(),
        })
    }
}

pub struct TelegramHandler {
    bot: Bot,
    relay: Arc<RelayService>,
}

impl TelegramHandler {
    pub fn new(bot: Bot, relay: Arc<RelayService>) -> Self {
        Self { bot, relay }
    }
}

#[async_trait]
impl UpdateProcessor for TelegramHandler {
    async fn process(&self, update: Update) -> anyhow::Result<()> {
        let Some(inbound) = InboundText::from_update(&update) else {
            tracing::debug!("Telegram: ignoring update {} (not a text message)", update.id.0);
            return Ok(());
        };

        tracing::info!(
            "Telegram: message {} from user {} in chat {}",
            inbound.message_id.0,
            inbound.user_id,
            inbound.chat_id.0
        );

        let replier = TelegramReplier::new(self.bot.clone(), inbound.chat_id, inbound.message_id);
        let outcome = self
            .relay
            .handle_text(inbound.user_id, &inbound.text, &replier)
            .await?;

        tracing::info!("Telegram: update {} handled: {:?}", update.id.0, outcome);
        Ok(())
    }
}
