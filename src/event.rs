//! Inbound events as seen by the flow controller.
//!
//! The transport layer builds exactly one `EventKind` per incoming message,
//! so the controller matches over a closed set instead of probing optional
//! message fields.

use teloxide::utils::command::BotCommands;

use crate::session::MediaRef;
use crate::session_store::UserKey;

/// Who sent an event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRef {
    pub id: UserKey,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

impl UserRef {
    pub fn new(id: UserKey) -> Self {
        Self {
            id,
            username: None,
            language_code: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_language(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = Some(language_code.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    Start,
    Help,
    Cancel,
    /// Explicit `/send`; the localized submit button arrives as `Text`
    Submit,
    Text(String),
    Photo(MediaRef),
    Video(MediaRef),
    Voice(MediaRef),
    Location { latitude: f64, longitude: f64 },
    Unsupported,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InboundEvent {
    pub user: UserRef,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn new(user: UserRef, kind: EventKind) -> Self {
        Self { user, kind }
    }

    /// Build a text event, turning commands addressed to `bot_name` into their own kinds
    pub fn from_text(user: UserRef, text: &str, bot_name: &str) -> Self {
        let kind = match parse_command(text, bot_name) {
            Some(Command::Start) => EventKind::Start,
            Some(Command::Help) => EventKind::Help,
            Some(Command::Cancel) => EventKind::Cancel,
            Some(Command::Send) => EventKind::Submit,
            None => EventKind::Text(text.to_string()),
        };
        Self { user, kind }
    }
}

/// Bot commands understood by the flow
///
/// Descriptions here are the fallback; the registered menu is localized.
#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "Start a new report.")]
    Start,
    #[command(description = "Send the collected report.")]
    Send,
    #[command(description = "Cancel the current report.")]
    Cancel,
    #[command(description = "Show help.")]
    Help,
}

/// Parse the first word as `/command` or `/command@bot_name`
///
/// Anything after the first word (a `/start` deep-link payload) is ignored.
pub fn parse_command(text: &str, bot_name: &str) -> Option<Command> {
    let first = text.split_whitespace().next()?;
    Command::parse(first, bot_name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT_NAME: &str = "civic_bot";

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/start", BOT_NAME), Some(Command::Start));
        assert_eq!(parse_command("/start@civic_bot", BOT_NAME), Some(Command::Start));
        assert_eq!(parse_command("  /send now", BOT_NAME), Some(Command::Send));
        assert_eq!(parse_command("/start ref-42", BOT_NAME), Some(Command::Start));
        assert_eq!(parse_command("/cancel", BOT_NAME), Some(Command::Cancel));
        assert_eq!(parse_command("/help", BOT_NAME), Some(Command::Help));
        assert_eq!(parse_command("/unknown", BOT_NAME), None);
        assert_eq!(parse_command("start", BOT_NAME), None);
        assert_eq!(parse_command("", BOT_NAME), None);
    }

    #[test]
    fn test_command_for_another_bot_is_text() {
        assert_eq!(parse_command("/start@other_bot", BOT_NAME), None);
        assert_eq!(
            InboundEvent::from_text(UserRef::new(1), "/send@other_bot", BOT_NAME).kind,
            EventKind::Text("/send@other_bot".to_string())
        );
    }

    #[test]
    fn test_from_text() {
        let user = UserRef::new(1);
        assert_eq!(
            InboundEvent::from_text(user.clone(), "/start", BOT_NAME).kind,
            EventKind::Start
        );
        assert_eq!(
            InboundEvent::from_text(user, "North", BOT_NAME).kind,
            EventKind::Text("North".to_string())
        );
    }
}
