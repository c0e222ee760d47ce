//! Conversion of Telegram messages into flow events

use teloxide::types::{Message, User};

use crate::event::{EventKind, InboundEvent, UserRef};
use crate::session::MediaRef;

/// Build the sender reference from a Telegram user
pub fn user_ref(user: &User) -> UserRef {
    UserRef {
        id: user.id.0,
        username: user.username.clone(),
        language_code: user.language_code.clone(),
    }
}

/// Classify a message; `None` when it has no user (channel posts)
///
/// Precedence: photo, video, voice, location, then text. Captions are
/// ignored. Anything else (stickers, documents, polls) becomes
/// `EventKind::Unsupported`. Commands count only when they carry no
/// `@` suffix or are addressed to `bot_name`.
pub fn inbound_event(msg: &Message, bot_name: &str) -> Option<InboundEvent> {
    let user = user_ref(msg.from.as_ref()?);

    if let Some(largest_photo) = msg.photo().and_then(|photos| photos.last()) {
        return Some(InboundEvent::new(
            user,
            EventKind::Photo(MediaRef::new(largest_photo.file.id.0.clone())),
        ));
    }
    if let Some(video) = msg.video() {
        return Some(InboundEvent::new(
            user,
            EventKind::Video(MediaRef::new(video.file.id.0.clone())),
        ));
    }
    if let Some(voice) = msg.voice() {
        return Some(InboundEvent::new(
            user,
            EventKind::Voice(MediaRef::new(voice.file.id.0.clone())),
        ));
    }
    if let Some(location) = msg.location() {
        return Some(InboundEvent::new(
            user,
            EventKind::Location {
                latitude: location.latitude,
                longitude: location.longitude,
            },
        ));
    }
    if let Some(text) = msg.text() {
        return Some(InboundEvent::from_text(user, text, bot_name));
    }

    Some(InboundEvent::new(user, EventKind::Unsupported))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const BOT_NAME: &str = "civic_bot";

    fn private_message(content: Value) -> Message {
        let mut message = json!({
            "message_id": 10,
            "date": 1_700_000_000,
            "chat": {"id": 42, "type": "private", "first_name": "Aziz"},
            "from": {
                "id": 42,
                "is_bot": false,
                "first_name": "Aziz",
                "username": "aziz",
                "language_code": "ru"
            }
        });
        if let (Some(target), Some(fields)) = (message.as_object_mut(), content.as_object()) {
            target.extend(fields.clone());
        }
        serde_json::from_value(message).expect("valid message")
    }

    fn photo_sizes() -> Value {
        json!([
            {"file_id": "small", "file_unique_id": "s", "file_size": 1200, "width": 90, "height": 90},
            {"file_id": "large", "file_unique_id": "l", "file_size": 98000, "width": 1280, "height": 960}
        ])
    }

    fn kind_of(content: Value) -> EventKind {
        inbound_event(&private_message(content), BOT_NAME)
            .expect("message has a sender")
            .kind
    }

    #[test]
    fn test_sender_is_copied() {
        let event = inbound_event(&private_message(json!({"text": "hi"})), BOT_NAME)
            .expect("event");
        assert_eq!(
            event.user,
            UserRef::new(42).with_username("aziz").with_language("ru")
        );
    }

    #[test]
    fn test_text_and_commands() {
        assert_eq!(
            kind_of(json!({"text": "North"})),
            EventKind::Text("North".to_string())
        );
        assert_eq!(kind_of(json!({"text": "/start"})), EventKind::Start);
        assert_eq!(kind_of(json!({"text": "/send@civic_bot"})), EventKind::Submit);
        assert_eq!(
            kind_of(json!({"text": "/send@other_bot"})),
            EventKind::Text("/send@other_bot".to_string())
        );
    }

    #[test]
    fn test_photo_uses_largest_size_and_ignores_caption() {
        assert_eq!(
            kind_of(json!({"photo": photo_sizes(), "caption": "pothole on Navoi street"})),
            EventKind::Photo(MediaRef::new("large"))
        );
    }

    #[test]
    fn test_video_voice_location() {
        assert_eq!(
            kind_of(json!({"video": {
                "file_id": "video-1",
                "file_unique_id": "v",
                "file_size": 524288,
                "width": 640,
                "height": 480,
                "duration": 12
            }})),
            EventKind::Video(MediaRef::new("video-1"))
        );
        assert_eq!(
            kind_of(json!({"voice": {
                "file_id": "voice-1",
                "file_unique_id": "o",
                "file_size": 4096,
                "duration": 3
            }})),
            EventKind::Voice(MediaRef::new("voice-1"))
        );
        assert_eq!(
            kind_of(json!({"location": {"latitude": 41.31, "longitude": 69.24}})),
            EventKind::Location {
                latitude: 41.31,
                longitude: 69.24
            }
        );
    }

    #[test]
    fn test_other_content_is_unsupported() {
        assert_eq!(
            kind_of(json!({"document": {
                "file_id": "doc-1",
                "file_unique_id": "d",
                "file_size": 20480,
                "file_name": "complaint.pdf"
            }})),
            EventKind::Unsupported
        );
        assert_eq!(
            kind_of(json!({"sticker": {
                "file_id": "sticker-1",
                "file_unique_id": "k",
                "file_size": 16639,
                "type": "regular",
                "width": 512,
                "height": 512,
                "is_animated": false,
                "is_video": false,
                "emoji": "👍"
            }})),
            EventKind::Unsupported
        );
    }

    #[test]
    fn test_message_without_sender_is_ignored() {
        let message: Message = serde_json::from_value(json!({
            "message_id": 11,
            "date": 1_700_000_000,
            "chat": {"id": -1001234567890_i64, "type": "channel", "title": "News"},
            "text": "channel post"
        }))
        .expect("valid channel post");

        assert!(inbound_event(&message, BOT_NAME).is_none());
    }
}
