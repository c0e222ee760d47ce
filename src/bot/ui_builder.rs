//! UI Builder module for creating keyboards and formatting messages

use html_escape::encode_text;
use teloxide::types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup};

// Import localization
use crate::localization::{t_args_lang, t_lang};

use crate::delivery::{DeliveryHeader, Sender};
use crate::errors::FlowError;
use crate::flow::Reply;
use crate::session::AttachmentKind;

/// Keyboard to attach to a reply
#[derive(Debug, Clone, PartialEq)]
pub enum Keyboard {
    /// Menu of selectable options
    Menu(Vec<String>),
    /// Single submit button
    Submit(String),
    Remove,
    /// Leave whatever keyboard the user has
    Unchanged,
}

/// Reply text (HTML) plus its keyboard
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReply {
    pub text: String,
    pub keyboard: Keyboard,
}

/// Render a flow reply in the user's language
pub fn render_reply(reply: &Reply, language_code: Option<&str>) -> RenderedReply {
    let submit_label = || t_lang("submit-button", language_code);

    match reply {
        Reply::Welcome { regions } => RenderedReply {
            text: t_lang("welcome", language_code),
            keyboard: Keyboard::Menu(regions.clone()),
        },
        Reply::RegionSelected { region, districts } => RenderedReply {
            text: t_args_lang(
                "region-selected",
                &[("region", &*encode_text(region))],
                language_code,
            ),
            keyboard: Keyboard::Menu(districts.clone()),
        },
        Reply::DistrictSelected {
            district,
            neighborhoods,
        } => RenderedReply {
            text: t_args_lang(
                "district-selected",
                &[("district", &*encode_text(district))],
                language_code,
            ),
            keyboard: Keyboard::Menu(neighborhoods.clone()),
        },
        Reply::NeighborhoodSelected { neighborhood } => {
            let submit = submit_label();
            RenderedReply {
                text: t_args_lang(
                    "neighborhood-selected",
                    &[
                        ("neighborhood", &*encode_text(neighborhood)),
                        ("submit", &*encode_text(&submit)),
                    ],
                    language_code,
                ),
                keyboard: Keyboard::Submit(submit),
            }
        }
        Reply::AttachmentAdded(kind) => RenderedReply {
            text: t_lang(attachment_key(*kind), language_code),
            keyboard: Keyboard::Unchanged,
        },
        Reply::Submitted { .. } => RenderedReply {
            text: t_lang("submitted", language_code),
            keyboard: Keyboard::Remove,
        },
        Reply::Cancelled => RenderedReply {
            text: t_lang("cancelled", language_code),
            keyboard: Keyboard::Remove,
        },
        Reply::Help => RenderedReply {
            text: t_args_lang(
                "help",
                &[("submit", &*encode_text(&submit_label()))],
                language_code,
            ),
            keyboard: Keyboard::Unchanged,
        },
        Reply::Rejected(err) => RenderedReply {
            text: t_lang(err.message_key(), language_code),
            keyboard: match err {
                FlowError::InvalidSelection { options, .. } => Keyboard::Menu(options.clone()),
                FlowError::NoActiveSession => Keyboard::Remove,
                _ => Keyboard::Unchanged,
            },
        },
    }
}

fn attachment_key(kind: AttachmentKind) -> &'static str {
    match kind {
        AttachmentKind::Text => "attachment-text",
        AttachmentKind::Photo => "attachment-photo",
        AttachmentKind::Video => "attachment-video",
        AttachmentKind::Voice => "attachment-voice",
        AttachmentKind::Location => "attachment-location",
    }
}

/// Create a reply keyboard laying out `labels` in rows of `columns`
pub fn create_menu_keyboard(labels: &[String], columns: usize) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = labels
        .chunks(columns.max(1))
        .map(|row| row.iter().map(|label| KeyboardButton::new(label.clone())).collect())
        .collect();

    KeyboardMarkup::new(rows).resize_keyboard()
}

/// Teloxide markup for a keyboard, `None` when it should stay as is
pub fn reply_markup(keyboard: &Keyboard, columns: usize) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::Menu(labels) => Some(create_menu_keyboard(labels, columns).into()),
        Keyboard::Submit(label) => Some(create_menu_keyboard(std::slice::from_ref(label), 1).into()),
        Keyboard::Remove => Some(KeyboardRemove::new().into()),
        Keyboard::Unchanged => None,
    }
}

/// Format the header announcing a submission to the official (HTML)
pub fn format_delivery_header(header: &DeliveryHeader, language_code: Option<&str>) -> String {
    let user = match &header.sender {
        Sender::Username(name) => format!("@{}", encode_text(name)),
        Sender::Anonymous => t_lang("anonymous", language_code),
    };
    let time = header.submitted_at.format("%Y-%m-%d %H:%M UTC").to_string();

    [
        t_lang("header-title", language_code),
        String::new(),
        t_args_lang(
            "header-region",
            &[("region", &*encode_text(&header.region))],
            language_code,
        ),
        t_args_lang(
            "header-district",
            &[("district", &*encode_text(&header.district))],
            language_code,
        ),
        t_args_lang(
            "header-neighborhood",
            &[("neighborhood", &*encode_text(&header.neighborhood))],
            language_code,
        ),
        t_args_lang("header-user", &[("user", user.as_str())], language_code),
        t_args_lang("header-time", &[("time", time.as_str())], language_code),
    ]
    .join("\n")
}
