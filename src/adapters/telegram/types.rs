//! Bot API wire types.
//!
//! Only the fields the bot reads are modelled; everything else in the JSON
//! is ignored.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::ports::{ButtonTarget, InlineKeyboard};

// ════════════════════════════════════════════════════════════════════════════════
// Response envelope
// ════════════════════════════════════════════════════════════════════════════════

/// `{ok, result, description, error_code, parameters}` wrapper of every
/// Bot API answer.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<u16>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Updates
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
    pub chat_join_request: Option<ChatJoinRequest>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Vec<IgnoredAny>,
    pub document: Option<IgnoredAny>,
    pub video: Option<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub username: Option<String>,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind.as_deref() == Some("private")
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatJoinRequest {
    pub chat: Chat,
    pub from: User,
}

#[derive(Debug, Deserialize)]
pub struct ChatInviteLink {
    pub invite_link: String,
    pub expire_date: Option<i64>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct ReplyMarkup {
    pub inline_keyboard: Vec<Vec<WireButton>>,
}

#[derive(Debug, Serialize)]
pub struct WireButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<&InlineKeyboard> for ReplyMarkup {
    fn from(keyboard: &InlineKeyboard) -> Self {
        let inline_keyboard = keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| {
                        let (callback_data, url) = match &button.target {
                            ButtonTarget::Callback(data) => (Some(data.clone()), None),
                            ButtonTarget::Url(url) => (None, Some(url.clone())),
                        };
                        WireButton {
                            text: button.text.clone(),
                            callback_data,
                            url,
                        }
                    })
                    .collect()
            })
            .collect();
        Self { inline_keyboard }
    }
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Serialize)]
pub struct EditMessageRequest<'a> {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: &'a str,
    pub disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Serialize)]
pub struct AnswerCallbackRequest<'a> {
    pub callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ForwardMessageRequest {
    pub chat_id: i64,
    pub from_chat_id: i64,
    pub message_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateInviteLinkRequest<'a> {
    pub chat_id: i64,
    pub name: &'a str,
    pub expire_date: i64,
    pub creates_join_request: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatMemberRequest {
    pub chat_id: i64,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_if_banned: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct GetChatRequest {
    pub chat_id: i64,
}

#[derive(Debug, Serialize)]
pub struct SetWebhookRequest<'a> {
    pub url: &'a str,
    pub secret_token: &'a str,
    pub allowed_updates: &'a [&'a str],
    pub drop_pending_updates: bool,
}
