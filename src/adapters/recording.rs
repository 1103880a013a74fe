//! Recording chat platform for testing.
//!
//! Captures every outbound action for assertions and can be told to fail
//! chosen operations, or everything addressed to a chat.
//!
//! # Security Note
//!
//! This adapter is for **testing only**. It uses `.expect()` on lock
//! operations which will panic if locks are poisoned.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{ChatId, MessageId, Timestamp, UserId};
use crate::ports::{ChatPlatform, InlineKeyboard, InviteLink, MessageRef, PlatformError};

/// Outbound operation kinds, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformOp {
    SendMessage,
    EditMessage,
    AnswerCallback,
    ForwardMessage,
    SendDocument,
    CreateInviteLink,
    ApproveJoinRequest,
    DeclineJoinRequest,
    RevokeMembership,
    FetchUsername,
}

/// One recorded outbound action. Failed attempts are recorded too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    SendMessage {
        chat: ChatId,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    EditMessage {
        message: MessageRef,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    AnswerCallback {
        callback_id: String,
        notice: Option<String>,
    },
    ForwardMessage {
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    },
    SendDocument {
        chat: ChatId,
        file_name: String,
        bytes: Vec<u8>,
        caption: Option<String>,
    },
    CreateInviteLink {
        group: ChatId,
        name: String,
        expires_at: Timestamp,
        creates_join_request: bool,
    },
    ApproveJoinRequest {
        group: ChatId,
        user: UserId,
    },
    DeclineJoinRequest {
        group: ChatId,
        user: UserId,
    },
    RevokeMembership {
        group: ChatId,
        user: UserId,
    },
    FetchUsername {
        user: UserId,
    },
}

#[derive(Default)]
struct State {
    calls: Vec<PlatformCall>,
    failing_ops: HashSet<PlatformOp>,
    failing_chats: HashSet<ChatId>,
    usernames: HashMap<UserId, String>,
    next_message_id: i64,
    next_invite: u64,
}

/// Chat platform that records instead of talking to a server.
#[derive(Default)]
pub struct RecordingPlatform {
    state: Mutex<State>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    // === Configuration ===

    /// Make every call of `op` fail.
    pub fn fail_on(&self, op: PlatformOp) {
        self.lock().failing_ops.insert(op);
    }

    /// Make every message or document addressed to `chat` fail, as when a
    /// user has blocked the bot.
    pub fn fail_chat(&self, chat: ChatId) {
        self.lock().failing_chats.insert(chat);
    }

    /// Clear all injected failures.
    pub fn heal(&self) {
        let mut state = self.lock();
        state.failing_ops.clear();
        state.failing_chats.clear();
    }

    pub fn set_username(&self, user: UserId, username: impl Into<String>) {
        self.lock().usernames.insert(user, username.into());
    }

    // === Test Helpers ===

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Texts of every message sent to `chat`, in order.
    pub fn messages_to(&self, chat: ChatId) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::SendMessage { chat: c, text, .. } if c == chat => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Users whose membership was revoked, in order.
    pub fn revocations(&self) -> Vec<UserId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::RevokeMembership { user, .. } => Some(user),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, op: PlatformOp) -> usize {
        self.calls().iter().filter(|call| Self::op_of(call) == op).count()
    }

    fn op_of(call: &PlatformCall) -> PlatformOp {
        match call {
            PlatformCall::SendMessage { .. } => PlatformOp::SendMessage,
            PlatformCall::EditMessage { .. } => PlatformOp::EditMessage,
            PlatformCall::AnswerCallback { .. } => PlatformOp::AnswerCallback,
            PlatformCall::ForwardMessage { .. } => PlatformOp::ForwardMessage,
            PlatformCall::SendDocument { .. } => PlatformOp::SendDocument,
            PlatformCall::CreateInviteLink { .. } => PlatformOp::CreateInviteLink,
            PlatformCall::ApproveJoinRequest { .. } => PlatformOp::ApproveJoinRequest,
            PlatformCall::DeclineJoinRequest { .. } => PlatformOp::DeclineJoinRequest,
            PlatformCall::RevokeMembership { .. } => PlatformOp::RevokeMembership,
            PlatformCall::FetchUsername { .. } => PlatformOp::FetchUsername,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("RecordingPlatform: state lock poisoned")
    }

    /// Record `call`, then fail if it was configured to.
    fn record(&self, call: PlatformCall, chat: Option<ChatId>) -> Result<(), PlatformError> {
        let op = Self::op_of(&call);
        let mut state = self.lock();
        state.calls.push(call);
        if state.failing_ops.contains(&op) {
            return Err(PlatformError::api(format!("injected failure for {:?}", op)));
        }
        if let Some(chat) = chat {
            if state.failing_chats.contains(&chat) {
                return Err(PlatformError::forbidden("bot was blocked by the user"));
            }
        }
        Ok(())
    }

    fn next_message(&self, chat: ChatId) -> MessageRef {
        let mut state = self.lock();
        state.next_message_id += 1;
        MessageRef::new(chat, MessageId::new(state.next_message_id))
    }
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef, PlatformError> {
        self.record(
            PlatformCall::SendMessage {
                chat,
                text: text.to_string(),
                keyboard: keyboard.cloned(),
            },
            Some(chat),
        )?;
        Ok(self.next_message(chat))
    }

    async fn edit_message(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), PlatformError> {
        self.record(
            PlatformCall::EditMessage {
                message,
                text: text.to_string(),
                keyboard: keyboard.cloned(),
            },
            Some(message.chat),
        )
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        notice: Option<&str>,
    ) -> Result<(), PlatformError> {
        self.record(
            PlatformCall::AnswerCallback {
                callback_id: callback_id.to_string(),
                notice: notice.map(str::to_string),
            },
            None,
        )
    }

    async fn forward_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageRef, PlatformError> {
        self.record(PlatformCall::ForwardMessage { to, from, message_id }, Some(to))?;
        Ok(self.next_message(to))
    }

    async fn send_document(
        &self,
        chat: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<MessageRef, PlatformError> {
        self.record(
            PlatformCall::SendDocument {
                chat,
                file_name: file_name.to_string(),
                bytes,
                caption: caption.map(str::to_string),
            },
            Some(chat),
        )?;
        Ok(self.next_message(chat))
    }

    async fn create_invite_link(
        &self,
        group: ChatId,
        name: &str,
        expires_at: Timestamp,
        creates_join_request: bool,
    ) -> Result<InviteLink, PlatformError> {
        self.record(
            PlatformCall::CreateInviteLink {
                group,
                name: name.to_string(),
                expires_at,
                creates_join_request,
            },
            None,
        )?;
        let mut state = self.lock();
        state.next_invite += 1;
        Ok(InviteLink {
            url: format!("https://t.me/+invite{}", state.next_invite),
            expires_at: Some(expires_at),
        })
    }

    async fn approve_join_request(&self, group: ChatId, user: UserId) -> Result<(), PlatformError> {
        self.record(PlatformCall::ApproveJoinRequest { group, user }, None)
    }

    async fn decline_join_request(&self, group: ChatId, user: UserId) -> Result<(), PlatformError> {
        self.record(PlatformCall::DeclineJoinRequest { group, user }, None)
    }

    async fn revoke_membership(&self, group: ChatId, user: UserId) -> Result<(), PlatformError> {
        self.record(PlatformCall::RevokeMembership { group, user }, None)
    }

    async fn fetch_username(&self, user: UserId) -> Result<Option<String>, PlatformError> {
        self.record(PlatformCall::FetchUsername { user }, None)?;
        Ok(self.lock().usernames.get(&user).cloned())
    }
}
