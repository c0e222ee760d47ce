//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use teloxide::types::{Me, ParseMode};
use tracing::{debug, error, info};

// Import localization
use crate::localization::t_lang;

use crate::config::BotConfig;
use crate::flow::FlowController;
use crate::session::Session;

use super::inbound::inbound_event;
use super::transport::deliver;
use super::ui_builder::{render_reply, reply_markup, Keyboard, RenderedReply};

/// Flow controller shared with the dispatcher
pub type Controller = FlowController<InMemStorage<Session>>;

/// Send a rendered reply to the user
async fn send_reply(
    bot: &Bot,
    chat_id: ChatId,
    reply: &RenderedReply,
    keyboard_columns: usize,
) -> Result<()> {
    let mut request = bot
        .send_message(chat_id, reply.text.clone())
        .parse_mode(ParseMode::Html);
    if let Some(markup) = reply_markup(&reply.keyboard, keyboard_columns) {
        request = request.reply_markup(markup);
    }
    request.await?;
    Ok(())
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    me: Me,
    controller: Arc<Controller>,
    config: Arc<BotConfig>,
) -> Result<()> {
    let Some(event) = inbound_event(&msg, me.username()) else {
        debug!(chat_id = %msg.chat.id, "Ignoring message without a sender");
        return Ok(());
    };
    debug!(user_id = event.user.id, kind = ?event.kind, "Received message from user");

    let outcome = match controller.handle(&event).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(user_id = event.user.id, error = %e, "Session storage failed");
            let reply = RenderedReply {
                text: t_lang("error-storage", event.user.language_code.as_deref()),
                keyboard: Keyboard::Remove,
            };
            return send_reply(&bot, msg.chat.id, &reply, config.keyboard_columns).await;
        }
    };
    let language_code = outcome.language_code.as_deref();
    let mut reply = render_reply(&outcome.reply, language_code);

    if let Some(payload) = &outcome.delivery {
        match deliver(&bot, payload, &config.delivery_language).await {
            Ok(()) => {
                info!(
                    user_id = event.user.id,
                    channel = %payload.channel,
                    attachments = payload.attachments.len(),
                    "Submission delivered"
                );
            }
            Err(e) => {
                error!(
                    user_id = event.user.id,
                    channel = %payload.channel,
                    error = %format!("{e:#}"),
                    "Failed to deliver submission"
                );
                reply = RenderedReply {
                    text: t_lang("error-delivery-failed", language_code),
                    keyboard: Keyboard::Remove,
                };
            }
        }
    }

    send_reply(&bot, msg.chat.id, &reply, config.keyboard_columns).await
}
