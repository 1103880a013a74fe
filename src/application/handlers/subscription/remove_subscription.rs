//! RemoveSubscriptionHandler - Command handler for `removesub`.

use std::sync::Arc;

use crate::domain::foundation::{ChatId, UserId};
use crate::domain::subscription::SubscriptionError;
use crate::ports::{ChatPlatform, SubscriptionStore};

/// Command to delete a subscription and remove the member.
#[derive(Debug, Clone)]
pub struct RemoveSubscriptionCommand {
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveSubscriptionResult {
    pub user_id: UserId,
    /// False when removal from the group failed after the row was deleted.
    pub revoked: bool,
}

pub struct RemoveSubscriptionHandler {
    store: Arc<dyn SubscriptionStore>,
    platform: Arc<dyn ChatPlatform>,
    group: ChatId,
}

impl RemoveSubscriptionHandler {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        platform: Arc<dyn ChatPlatform>,
        group: ChatId,
    ) -> Self {
        Self {
            store,
            platform,
            group,
        }
    }

    pub async fn handle(
        &self,
        cmd: RemoveSubscriptionCommand,
    ) -> Result<RemoveSubscriptionResult, SubscriptionError> {
        let deleted = self.store.delete(cmd.user_id).await?;
        if !deleted {
            return Err(SubscriptionError::not_found(cmd.user_id));
        }
        tracing::info!(user_id = %cmd.user_id, "Subscription deleted");

        let revoked = match self.platform.revoke_membership(self.group, cmd.user_id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(user_id = %cmd.user_id, error = %e, "Failed to remove member");
                false
            }
        };

        Ok(RemoveSubscriptionResult {
            user_id: cmd.user_id,
            revoked,
        })
    }
}
