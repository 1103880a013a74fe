//! Inbound events from the chat platform.

use crate::domain::foundation::{ChatId, MessageId, UserId};

use super::CallbackAction;

/// Who sent an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl Sender {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            username: None,
            first_name: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Best-effort human label: `@handle`, then first name, then id.
    pub fn label(&self) -> String {
        match (&self.username, &self.first_name) {
            (Some(u), _) => format!("@{}", u),
            (None, Some(name)) => name.clone(),
            (None, None) => format!("id {}", self.id),
        }
    }
}

/// Kind of attachment accepted as proof of payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Document,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Document => "document",
            MediaKind::Video => "video",
        }
    }
}

/// Closed set of events the bot reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Attachment in a private chat.
    Media {
        sender: Sender,
        chat: ChatId,
        message_id: MessageId,
        kind: MediaKind,
    },

    /// Text in a private chat.
    Text {
        sender: Sender,
        chat: ChatId,
        text: String,
    },

    /// Button press.
    Callback {
        id: String,
        sender: Sender,
        action: CallbackAction,
        /// Message carrying the pressed keyboard, when still accessible.
        origin: Option<(ChatId, MessageId)>,
    },

    /// Request to join a group that requires approval.
    JoinRequest { sender: Sender, chat: ChatId },
}

impl InboundEvent {
    pub fn sender(&self) -> &Sender {
        match self {
            InboundEvent::Media { sender, .. }
            | InboundEvent::Text { sender, .. }
            | InboundEvent::Callback { sender, .. }
            | InboundEvent::JoinRequest { sender, .. } => sender,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Media { .. } => "media",
            InboundEvent::Text { .. } => "text",
            InboundEvent::Callback { .. } => "callback",
            InboundEvent::JoinRequest { .. } => "join_request",
        }
    }
}
