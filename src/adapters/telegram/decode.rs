//! Update decoding.
//!
//! Turns a raw Bot API update into at most one [`InboundEvent`]. Updates
//! the bot does not act on (group chatter, edits, bots, stickers) decode to
//! `None`.

use crate::domain::foundation::{ChatId, MessageId, UserId};
use crate::domain::inbound::{CallbackAction, InboundEvent, MediaKind, Sender};

use super::types::{Message, Update, User};

/// Parse an update body.
pub fn decode_update_json(body: &[u8]) -> Result<Option<InboundEvent>, serde_json::Error> {
    let update: Update = serde_json::from_slice(body)?;
    Ok(decode_update(update))
}

/// Convert a parsed update.
pub fn decode_update(update: Update) -> Option<InboundEvent> {
    if let Some(query) = update.callback_query {
        let sender = sender_of(&query.from)?;
        let data = query.data?;
        let origin = query
            .message
            .map(|m| (ChatId::new(m.chat.id), MessageId::new(m.message_id)));
        return Some(InboundEvent::Callback {
            id: query.id,
            sender,
            action: CallbackAction::parse(&data),
            origin,
        });
    }

    if let Some(request) = update.chat_join_request {
        let sender = sender_of(&request.from)?;
        return Some(InboundEvent::JoinRequest {
            sender,
            chat: ChatId::new(request.chat.id),
        });
    }

    update.message.and_then(decode_message)
}

fn decode_message(message: Message) -> Option<InboundEvent> {
    if !message.chat.is_private() {
        return None;
    }
    let sender = sender_of(message.from.as_ref()?)?;
    let chat = ChatId::new(message.chat.id);

    if let Some(kind) = media_kind(&message) {
        return Some(InboundEvent::Media {
            sender,
            chat,
            message_id: MessageId::new(message.message_id),
            kind,
        });
    }

    message.text.map(|text| InboundEvent::Text { sender, chat, text })
}

fn media_kind(message: &Message) -> Option<MediaKind> {
    if !message.photo.is_empty() {
        Some(MediaKind::Photo)
    } else if message.document.is_some() {
        Some(MediaKind::Document)
    } else if message.video.is_some() {
        Some(MediaKind::Video)
    } else {
        None
    }
}

fn sender_of(user: &User) -> Option<Sender> {
    if user.is_bot {
        return None;
    }
    Some(Sender {
        id: UserId::new(user.id).ok()?,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::subscription::Tier;

    fn decode(json: serde_json::Value) -> Option<InboundEvent> {
        decode_update_json(json.to_string().as_bytes()).unwrap()
    }

    fn private_chat(id: i64) -> serde_json::Value {
        serde_json::json!({"id": id, "type": "private", "first_name": "Anna"})
    }

    fn user(id: i64) -> serde_json::Value {
        serde_json::json!({"id": id, "is_bot": false, "first_name": "Anna", "username": "anna"})
    }

    #[test]
    fn decodes_private_text() {
        let event = decode(serde_json::json!({
            "update_id": 1,
            "message": {"message_id": 10, "date": 0, "from": user(5), "chat": private_chat(5), "text": "/start"}
        }))
        .unwrap();

        match event {
            InboundEvent::Text { sender, chat, text } => {
                assert_eq!(sender.id.get(), 5);
                assert_eq!(sender.username.as_deref(), Some("anna"));
                assert_eq!(chat, ChatId::new(5));
                assert_eq!(text, "/start");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn decodes_photo_as_media() {
        let event = decode(serde_json::json!({
            "update_id": 2,
            "message": {
                "message_id": 11, "date": 0, "from": user(5), "chat": private_chat(5),
                "photo": [{"file_id": "a", "file_unique_id": "b", "width": 1, "height": 1}],
                "caption": "receipt"
            }
        }))
        .unwrap();

        assert!(matches!(
            event,
            InboundEvent::Media { kind: MediaKind::Photo, message_id, .. } if message_id == MessageId::new(11)
        ));
    }

    #[test]
    fn decodes_document_and_video() {
        let doc = decode(serde_json::json!({
            "update_id": 3,
            "message": {"message_id": 12, "from": user(5), "chat": private_chat(5), "document": {"file_id": "x"}}
        }));
        let video = decode(serde_json::json!({
            "update_id": 4,
            "message": {"message_id": 13, "from": user(5), "chat": private_chat(5), "video": {"file_id": "y"}}
        }));

        assert!(matches!(doc, Some(InboundEvent::Media { kind: MediaKind::Document, .. })));
        assert!(matches!(video, Some(InboundEvent::Media { kind: MediaKind::Video, .. })));
    }

    #[test]
    fn ignores_group_messages() {
        let event = decode(serde_json::json!({
            "update_id": 5,
            "message": {"message_id": 14, "from": user(5), "chat": {"id": -100, "type": "supergroup"}, "text": "hi"}
        }));
        assert_eq!(event, None);
    }

    #[test]
    fn ignores_messages_from_bots() {
        let event = decode(serde_json::json!({
            "update_id": 6,
            "message": {
                "message_id": 15,
                "from": {"id": 9, "is_bot": true, "first_name": "Bot"},
                "chat": private_chat(9),
                "text": "hi"
            }
        }));
        assert_eq!(event, None);
    }

    #[test]
    fn decodes_callback_with_origin() {
        let event = decode(serde_json::json!({
            "update_id": 7,
            "callback_query": {
                "id": "cb1",
                "from": user(5),
                "message": {"message_id": 20, "date": 0, "chat": private_chat(5)},
                "data": "tariff_1month"
            }
        }))
        .unwrap();

        assert_eq!(
            event,
            InboundEvent::Callback {
                id: "cb1".to_string(),
                sender: Sender {
                    id: UserId::new(5).unwrap(),
                    username: Some("anna".to_string()),
                    first_name: Some("Anna".to_string()),
                },
                action: CallbackAction::SelectTier(Tier::OneMonth),
                origin: Some((ChatId::new(5), MessageId::new(20))),
            }
        );
    }

    #[test]
    fn decodes_join_request() {
        let event = decode(serde_json::json!({
            "update_id": 8,
            "chat_join_request": {
                "chat": {"id": -100123, "type": "supergroup", "title": "Club"},
                "from": user(5),
                "user_chat_id": 5,
                "date": 0
            }
        }))
        .unwrap();

        assert!(matches!(
            event,
            InboundEvent::JoinRequest { chat, .. } if chat == ChatId::new(-100123)
        ));
    }

    #[test]
    fn unrelated_updates_decode_to_none() {
        let event = decode(serde_json::json!({
            "update_id": 9,
            "edited_message": {"message_id": 1, "chat": private_chat(5), "text": "x"}
        }));
        assert_eq!(event, None);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode_update_json(b"not json").is_err());
    }
}
