//! HandleJoinRequestHandler - the join gate.
//!
//! Invite links only open a join request. This handler is where entitlement
//! is enforced: only users with an active or grace subscription get in.

use std::sync::Arc;

use crate::application::presenter;
use crate::domain::foundation::{ChatId, UserId};
use crate::domain::inbound::Sender;
use crate::domain::subscription::SubscriptionError;
use crate::ports::{ChatPlatform, SubscriptionStore};

/// Command for one join request.
#[derive(Debug, Clone)]
pub struct HandleJoinRequestCommand {
    pub sender: Sender,
    pub chat: ChatId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinDecision {
    Approved,
    Declined,
    /// Request for a chat other than the managed group.
    Ignored,
}

pub struct HandleJoinRequestHandler {
    store: Arc<dyn SubscriptionStore>,
    platform: Arc<dyn ChatPlatform>,
    group: ChatId,
    admin_chat: ChatId,
}

impl HandleJoinRequestHandler {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        platform: Arc<dyn ChatPlatform>,
        group: ChatId,
        admin_chat: ChatId,
    ) -> Self {
        Self {
            store,
            platform,
            group,
            admin_chat,
        }
    }

    /// A store failure leaves the request pending rather than guessing.
    pub async fn handle(
        &self,
        cmd: HandleJoinRequestCommand,
    ) -> Result<JoinDecision, SubscriptionError> {
        if cmd.chat != self.group {
            tracing::debug!(chat = %cmd.chat, "Join request for unmanaged chat ignored");
            return Ok(JoinDecision::Ignored);
        }

        let user = cmd.sender.id;
        let entitled = self
            .store
            .get(user)
            .await?
            .map(|sub| sub.has_access())
            .unwrap_or(false);

        if entitled {
            self.platform.approve_join_request(self.group, user).await?;
            tracing::info!(user_id = %user, "Join request approved");
            self.send(user.chat(), presenter::join_approved_text(), user).await;
            Ok(JoinDecision::Approved)
        } else {
            if let Err(e) = self.platform.decline_join_request(self.group, user).await {
                tracing::warn!(user_id = %user, error = %e, "Failed to decline join request");
            }
            tracing::info!(user_id = %user, "Join request declined");
            let text = presenter::admin_unauthorized_join(&cmd.sender);
            self.send(self.admin_chat, &text, user).await;
            Ok(JoinDecision::Declined)
        }
    }

    async fn send(&self, chat: ChatId, text: &str, user: UserId) {
        if let Err(e) = self.platform.send_message(chat, text, None).await {
            tracing::warn!(user_id = %user, chat = %chat, error = %e, "Failed to send join notice");
        }
    }
}
