//! Transport module forwarding accepted submissions to officials

use anyhow::{Context, Result};
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, ParseMode, Recipient};
use tracing::debug;

use crate::delivery::{DeliveryPayload, Outbound};
use crate::hierarchy::ChannelId;
use crate::session::{Attachment, MediaRef};

use super::ui_builder::format_delivery_header;

/// Telegram recipient for a destination channel
pub fn recipient(channel: &ChannelId) -> Recipient {
    match channel {
        ChannelId::Numeric(id) => Recipient::Id(ChatId(*id)),
        ChannelId::Username(name) => Recipient::ChannelUsername(name.clone()),
    }
}

fn input_file(media: &MediaRef) -> InputFile {
    InputFile::file_id(FileId(media.as_str().to_string()))
}

/// Send the header and then every attachment, one at a time, in order
///
/// Stops at the first failed send; what was already sent stays sent.
pub async fn deliver(bot: &Bot, payload: &DeliveryPayload, language_code: &str) -> Result<()> {
    let to = recipient(&payload.channel);

    for (position, outbound) in payload.sequence().enumerate() {
        match outbound {
            Outbound::Header(header) => {
                bot.send_message(to.clone(), format_delivery_header(header, Some(language_code)))
                    .parse_mode(ParseMode::Html)
                    .await
                    .with_context(|| format!("Failed to send header to {}", payload.channel))?;
            }
            Outbound::Attachment(attachment) => {
                send_attachment(bot, to.clone(), attachment)
                    .await
                    .with_context(|| {
                        format!(
                            "Failed to send attachment {position} ({:?}) to {}",
                            attachment.kind(),
                            payload.channel
                        )
                    })?;
            }
        }
        debug!(channel = %payload.channel, position, "Outbound message sent");
    }

    Ok(())
}

async fn send_attachment(bot: &Bot, to: Recipient, attachment: &Attachment) -> Result<()> {
    match attachment {
        // User text goes out verbatim, no parse mode
        Attachment::Text(text) => {
            bot.send_message(to, text.clone()).await?;
        }
        Attachment::Photo(media) => {
            bot.send_photo(to, input_file(media)).await?;
        }
        Attachment::Video(media) => {
            bot.send_video(to, input_file(media)).await?;
        }
        Attachment::Voice(media) => {
            bot.send_voice(to, input_file(media)).await?;
        }
        Attachment::Location {
            latitude,
            longitude,
        } => {
            bot.send_location(to, *latitude, *longitude).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_from_channel() {
        assert_eq!(
            recipient(&ChannelId::Numeric(-1001)),
            Recipient::Id(ChatId(-1001))
        );
        assert_eq!(
            recipient(&ChannelId::Username("@zone_x".to_string())),
            Recipient::ChannelUsername("@zone_x".to_string())
        );
    }
}
