//! Telegram Bot API adapter.
//!
//! Implements the `ChatPlatform` trait over HTTPS with `reqwest`.
//!
//! # Security
//!
//! - The bot token is part of every request URL, so transport errors are
//!   stripped of their URL before they are logged or returned
//! - Token held in `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = TelegramConfig::new(token).with_base_url("http://localhost:8081");
//! let client = TelegramClient::new(config);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ChatId, MessageId, Timestamp, UserId};
use crate::ports::{ChatPlatform, InlineKeyboard, InviteLink, MessageRef, PlatformError};

use super::types::{
    AnswerCallbackRequest, ApiResponse, Chat, ChatInviteLink, ChatMemberRequest,
    CreateInviteLinkRequest, EditMessageRequest, ForwardMessageRequest, GetChatRequest, Message,
    ReplyMarkup, SendMessageRequest, SetWebhookRequest,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Update kinds the bot subscribes to.
const ALLOWED_UPDATES: [&str; 3] = ["message", "callback_query", "chat_join_request"];

/// Bot API configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    bot_token: SecretString,

    /// Base URL for the Bot API (default: https://api.telegram.org).
    api_base_url: String,
}

impl TelegramConfig {
    pub fn new(bot_token: SecretString) -> Self {
        Self {
            bot_token,
            api_base_url: "https://api.telegram.org".to_string(),
        }
    }

    /// Set a custom API base URL (local Bot API server, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Telegram Bot API client.
pub struct TelegramClient {
    config: TelegramConfig,
    http_client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base_url,
            self.config.bot_token.expose_secret(),
            method
        )
    }

    /// Call a JSON method and unwrap the response envelope.
    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, PlatformError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http_client
            .post(self.method_url(method))
            .timeout(REQUEST_TIMEOUT)
            .json(params)
            .send()
            .await
            .map_err(|e| PlatformError::network(e.without_url().to_string()))?;

        self.read_response(method, response).await
    }

    async fn read_response<R: DeserializeOwned>(
        &self,
        method: &str,
        response: reqwest::Response,
    ) -> Result<R, PlatformError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PlatformError::network(e.without_url().to_string()))?;

        parse_envelope(status, &body).map_err(|err| {
            tracing::warn!(method, code = %err.code, error = %err.message, "Bot API call failed");
            err
        })
    }

    /// Register the webhook URL and its secret header value.
    pub async fn set_webhook(&self, url: &str, secret: &SecretString) -> Result<(), PlatformError> {
        let request = SetWebhookRequest {
            url,
            secret_token: secret.expose_secret(),
            allowed_updates: &ALLOWED_UPDATES,
            drop_pending_updates: false,
        };
        let _: bool = self.call("setWebhook", &request).await?;
        tracing::info!(url, "Webhook registered");
        Ok(())
    }
}

/// Decode a Bot API answer into its `result`, mapping failures to
/// platform error codes.
fn parse_envelope<R: DeserializeOwned>(status: StatusCode, body: &str) -> Result<R, PlatformError> {
    let envelope: ApiResponse<R> = serde_json::from_str(body).map_err(|e| {
        PlatformError::invalid_response(format!("HTTP {}: undecodable body: {}", status.as_u16(), e))
    })?;

    if envelope.ok {
        return envelope
            .result
            .ok_or_else(|| PlatformError::invalid_response("ok response without result"));
    }

    let code = envelope.error_code.unwrap_or(status.as_u16());
    let description = envelope.description.unwrap_or_else(|| "no description".to_string());

    Err(match code {
        429 => PlatformError::rate_limited(envelope.parameters.and_then(|p| p.retry_after)),
        403 => PlatformError::forbidden(description),
        400 | 404 if description.to_lowercase().contains("not found") => {
            PlatformError::not_found(description)
        }
        _ => PlatformError::api(format!("{}: {}", code, description)),
    })
}

fn message_ref(message: &Message) -> MessageRef {
    MessageRef::new(ChatId::new(message.chat.id), MessageId::new(message.message_id))
}

/// `editMessageText` answers with the message or with `true`.
#[derive(Deserialize)]
#[serde(untagged)]
enum EditResult {
    Message(Box<Message>),
    Flag(bool),
}

#[async_trait]
impl ChatPlatform for TelegramClient {
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef, PlatformError> {
        let request = SendMessageRequest {
            chat_id: chat.get(),
            text,
            disable_web_page_preview: true,
            reply_markup: keyboard.map(ReplyMarkup::from),
        };
        let message: Message = self.call("sendMessage", &request).await?;
        Ok(message_ref(&message))
    }

    async fn edit_message(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), PlatformError> {
        let request = EditMessageRequest {
            chat_id: message.chat.get(),
            message_id: message.message_id.get(),
            text,
            disable_web_page_preview: true,
            reply_markup: keyboard.map(ReplyMarkup::from),
        };
        let _: EditResult = self.call("editMessageText", &request).await?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        notice: Option<&str>,
    ) -> Result<(), PlatformError> {
        let request = AnswerCallbackRequest {
            callback_query_id: callback_id,
            text: notice,
        };
        let _: bool = self.call("answerCallbackQuery", &request).await?;
        Ok(())
    }

    async fn forward_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageRef, PlatformError> {
        let request = ForwardMessageRequest {
            chat_id: to.get(),
            from_chat_id: from.get(),
            message_id: message_id.get(),
        };
        let message: Message = self.call("forwardMessage", &request).await?;
        Ok(message_ref(&message))
    }

    async fn send_document(
        &self,
        chat: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<MessageRef, PlatformError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/json")
            .map_err(|e| PlatformError::api(e.to_string()))?;

        let mut form = Form::new()
            .text("chat_id", chat.get().to_string())
            .part("document", part);
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }

        let response = self
            .http_client
            .post(self.method_url("sendDocument"))
            .timeout(REQUEST_TIMEOUT)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PlatformError::network(e.without_url().to_string()))?;

        let message: Message = self.read_response("sendDocument", response).await?;
        Ok(message_ref(&message))
    }

    async fn create_invite_link(
        &self,
        group: ChatId,
        name: &str,
        expires_at: Timestamp,
        creates_join_request: bool,
    ) -> Result<InviteLink, PlatformError> {
        let request = CreateInviteLinkRequest {
            chat_id: group.get(),
            name,
            expire_date: expires_at.as_unix_secs(),
            creates_join_request,
        };
        let link: ChatInviteLink = self.call("createChatInviteLink", &request).await?;
        Ok(InviteLink {
            url: link.invite_link,
            expires_at: link.expire_date.and_then(Timestamp::from_unix_secs),
        })
    }

    async fn approve_join_request(&self, group: ChatId, user: UserId) -> Result<(), PlatformError> {
        let request = ChatMemberRequest {
            chat_id: group.get(),
            user_id: user.get(),
            only_if_banned: None,
        };
        let _: bool = self.call("approveChatJoinRequest", &request).await?;
        Ok(())
    }

    async fn decline_join_request(&self, group: ChatId, user: UserId) -> Result<(), PlatformError> {
        let request = ChatMemberRequest {
            chat_id: group.get(),
            user_id: user.get(),
            only_if_banned: None,
        };
        let _: bool = self.call("declineChatJoinRequest", &request).await?;
        Ok(())
    }

    async fn revoke_membership(&self, group: ChatId, user: UserId) -> Result<(), PlatformError> {
        let ban = ChatMemberRequest {
            chat_id: group.get(),
            user_id: user.get(),
            only_if_banned: None,
        };
        let _: bool = self.call("banChatMember", &ban).await?;

        let unban = ChatMemberRequest {
            chat_id: group.get(),
            user_id: user.get(),
            only_if_banned: Some(true),
        };
        match self.call::<_, bool>("unbanChatMember", &unban).await {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::error!(user_id = %user, error = %err, "User removed but still banned");
                Err(PlatformError::partial_revoke(format!(
                    "user {} removed but unban failed: {}",
                    user, err
                )))
            }
        }
    }

    async fn fetch_username(&self, user: UserId) -> Result<Option<String>, PlatformError> {
        let chat: Chat = self.call("getChat", &GetChatRequest { chat_id: user.get() }).await?;
        Ok(chat.username)
    }
}
