//! Chat platform port - the outbound action API.
//!
//! Everything the bot does to the outside world goes through this trait:
//! messages, files, invite links, join request decisions, and membership
//! revocation.
//!
//! # Design
//!
//! - **Best-effort**: every call is fallible and never retried by the port
//! - **Kick is one action**: `revoke_membership` removes a member without a
//!   permanent block, so callers cannot leave a half-done ban behind

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ChatId, DomainError, ErrorCode, MessageId, Timestamp, UserId};
use crate::domain::inbound::CallbackAction;
use crate::domain::subscription::SubscriptionError;

/// Port for the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Send a text message, optionally with inline buttons.
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef, PlatformError>;

    /// Replace the text (and keyboard) of a message the bot sent earlier.
    async fn edit_message(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), PlatformError>;

    /// Acknowledge a button press, optionally with a transient notice.
    async fn answer_callback(
        &self,
        callback_id: &str,
        notice: Option<&str>,
    ) -> Result<(), PlatformError>;

    /// Forward a message to another chat.
    async fn forward_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageRef, PlatformError>;

    /// Upload a file.
    async fn send_document(
        &self,
        chat: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<MessageRef, PlatformError>;

    /// Mint an invite link for `group` valid until `expires_at`.
    ///
    /// With `creates_join_request` the link only opens a join request, which
    /// the join gate then decides.
    async fn create_invite_link(
        &self,
        group: ChatId,
        name: &str,
        expires_at: Timestamp,
        creates_join_request: bool,
    ) -> Result<InviteLink, PlatformError>;

    async fn approve_join_request(&self, group: ChatId, user: UserId)
        -> Result<(), PlatformError>;

    async fn decline_join_request(&self, group: ChatId, user: UserId)
        -> Result<(), PlatformError>;

    /// Remove a member while allowing a later rejoin.
    async fn revoke_membership(&self, group: ChatId, user: UserId) -> Result<(), PlatformError>;

    /// Public handle of a user, if they have one.
    async fn fetch_username(&self, user: UserId) -> Result<Option<String>, PlatformError>;
}

/// Handle to a message the platform accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat: ChatId,
    pub message_id: MessageId,
}

impl MessageRef {
    pub fn new(chat: ChatId, message_id: MessageId) -> Self {
        Self { chat, message_id }
    }
}

/// Invite link minted by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteLink {
    pub url: String,
    pub expires_at: Option<Timestamp>,
}

/// Inline keyboard attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row with a single button.
    pub fn button(mut self, button: InlineButton) -> Self {
        self.rows.push(vec![button]);
        self
    }

    pub fn row(mut self, buttons: Vec<InlineButton>) -> Self {
        self.rows.push(buttons);
        self
    }
}

/// One inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub target: ButtonTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonTarget {
    Callback(String),
    Url(String),
}

impl InlineButton {
    pub fn action(text: impl Into<String>, action: &CallbackAction) -> Self {
        Self {
            text: text.into(),
            target: ButtonTarget::Callback(action.encode()),
        }
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target: ButtonTarget::Url(url.into()),
        }
    }
}

/// Errors from platform operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformError {
    pub code: PlatformErrorCode,
    pub message: String,
    /// Seconds the platform asked us to wait, for rate limits.
    pub retry_after: Option<u64>,
}

impl PlatformError {
    pub fn new(code: PlatformErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PlatformErrorCode::Network, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(PlatformErrorCode::ApiError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(PlatformErrorCode::NotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(PlatformErrorCode::Forbidden, message)
    }

    pub fn rate_limited(retry_after: Option<u64>) -> Self {
        Self {
            code: PlatformErrorCode::RateLimited,
            message: "too many requests".to_string(),
            retry_after,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(PlatformErrorCode::InvalidResponse, message)
    }

    /// The removal happened but re-allowing the user did not.
    pub fn partial_revoke(message: impl Into<String>) -> Self {
        Self::new(PlatformErrorCode::PartialRevoke, message)
    }
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PlatformError {}

impl From<PlatformError> for DomainError {
    fn from(err: PlatformError) -> Self {
        let code = match err.code {
            PlatformErrorCode::RateLimited => ErrorCode::RateLimited,
            _ => ErrorCode::PlatformError,
        };
        DomainError::new(code, err.to_string())
    }
}

impl From<PlatformError> for SubscriptionError {
    fn from(err: PlatformError) -> Self {
        SubscriptionError::platform(err.to_string())
    }
}

/// Platform error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformErrorCode {
    /// Request never got an answer.
    Network,

    /// Platform rejected the request.
    ApiError,

    /// Chat, user, or message does not exist.
    NotFound,

    /// Bot lacks rights, or the user blocked the bot.
    Forbidden,

    RateLimited,

    /// Answer could not be decoded.
    InvalidResponse,

    /// Member was removed but the follow-up unban failed.
    PartialRevoke,
}

impl std::fmt::Display for PlatformErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlatformErrorCode::Network => "network_error",
            PlatformErrorCode::ApiError => "api_error",
            PlatformErrorCode::NotFound => "not_found",
            PlatformErrorCode::Forbidden => "forbidden",
            PlatformErrorCode::RateLimited => "rate_limited",
            PlatformErrorCode::InvalidResponse => "invalid_response",
            PlatformErrorCode::PartialRevoke => "partial_revoke",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inbound::AdminAction;

    #[test]
    fn chat_platform_is_object_safe() {
        fn _accepts_dyn(_platform: &dyn ChatPlatform) {}
    }

    #[test]
    fn buttons_carry_encoded_actions() {
        let button = InlineButton::action("Stats", &CallbackAction::Admin(AdminAction::Stats));
        assert_eq!(button.target, ButtonTarget::Callback("admin_stats".to_string()));
    }

    #[test]
    fn keyboard_builder_appends_rows() {
        let kb = InlineKeyboard::new()
            .button(InlineButton::action("Back", &CallbackAction::Back))
            .row(vec![
                InlineButton::url("Site", "https://example.com"),
                InlineButton::action("Status", &CallbackAction::MyStatus),
            ]);
        assert_eq!(kb.rows.len(), 2);
        assert_eq!(kb.rows[1].len(), 2);
    }

    #[test]
    fn platform_error_display() {
        let err = PlatformError::forbidden("bot was blocked by the user");
        assert_eq!(err.to_string(), "forbidden: bot was blocked by the user");
    }

    #[test]
    fn rate_limit_converts_to_rate_limited_code() {
        let err: DomainError = PlatformError::rate_limited(Some(3)).into();
        assert_eq!(err.code, ErrorCode::RateLimited);

        let err: DomainError = PlatformError::network("timeout").into();
        assert_eq!(err.code, ErrorCode::PlatformError);
    }

    #[test]
    fn converts_to_subscription_error() {
        let err: SubscriptionError = PlatformError::api("chat not found").into();
        assert!(matches!(err, SubscriptionError::Platform { .. }));
    }
}
