//! Telegram Bot Startup
//!
//! Wires config into the relay, registers the webhook with Telegram, and
//! serves the endpoint until Ctrl-C.

use super::handler::TelegramHandler;
use super::webhook;
use crate::config::Config;
use crate::instagram::InstagramClient;
use crate::relay::RelayService;
use anyhow::Context;
use std::sync::Arc;
use teloxide::prelude::*;
use url::Url;

pub async fn run(config: &Config) -> anyhow::Result<()> {
    let webhook_url = config
        .telegram
        .webhook_url
        .as_deref()
        .context("Telegram webhook URL is not configured")?;
    let webhook_url = Url::parse(webhook_url)
        .with_context(|| format!("Invalid webhook URL: {}", webhook_url))?;
    let addr = config.server.socket_addr()?;

    tracing::info!(
        "Starting Telegram relay with {} allowed user(s)",
        config.telegram.allowed_users.len()
    );

    let bot = Bot::new(config.telegram.token.expose_secret());
    match bot.get_me().await {
        Ok(me) => {
            if let Some(ref username) = me.username {
                tracing::info!("Telegram: bot username is @{}", username);
            }
        }
        Err(e) => {
            tracing::warn!("Telegram: failed to get bot info (get_me): {}", e);
        }
    }

    let instagram = InstagramClient::new(&config.instagram)?;
    let relay = Arc::new(RelayService::new(config, Arc::new(instagram)));

    let cleared = relay
        .scratch()
        .clear()
        .with_context(|| format!("Failed to prepare scratch directory {:?}", relay.scratch().path()))?;
    if cleared > 0 {
        tracing::info!("Scratch: removed {} leftover entries", cleared);
    }

    bot.set_webhook(webhook_url.clone())
        .await
        .context("Failed to register webhook with Telegram")?;
    tracing::info!("Telegram: webhook set to {}", webhook_url);

    let handler = Arc::new(TelegramHandler::new(bot.clone(), relay));
    let app = webhook::router(&config.server.path, handler);
    let served = webhook::serve(addr, app, shutdown_signal()).await;

    match bot.delete_webhook().await {
        Ok(_) => tracing::info!("Telegram: webhook deleted"),
        Err(e) => tracing::warn!("Telegram: failed to delete webhook: {}", e),
    }

    served
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
        Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
    }
}
