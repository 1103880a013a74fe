//! Invite issuer.
//!
//! Mints personal invite links for the managed group and hands them to
//! users. Links only open a join request; the join gate decides.

use std::sync::Arc;

use chrono::Duration;

use crate::domain::foundation::{ChatId, Timestamp, UserId};
use crate::domain::subscription::Subscription;
use crate::ports::{ChatPlatform, InviteLink, PlatformError};

use super::presenter;

pub struct InviteIssuer {
    platform: Arc<dyn ChatPlatform>,
    group: ChatId,
    validity: Duration,
}

impl InviteIssuer {
    pub fn new(platform: Arc<dyn ChatPlatform>, group: ChatId, validity: Duration) -> Self {
        Self {
            platform,
            group,
            validity,
        }
    }

    /// Create a join-request link for `user`, valid for the configured window.
    pub async fn mint(&self, user: UserId, now: Timestamp) -> Result<InviteLink, PlatformError> {
        let name = format!("sub-{}", user);
        let expires_at = now.plus(self.validity);

        let link = self
            .platform
            .create_invite_link(self.group, &name, expires_at, true)
            .await?;

        tracing::info!(user_id = %user, expires_at = %expires_at.to_storage_string(), "Invite link created");
        Ok(link)
    }

    /// Message `link` to the subscriber with `text` above it.
    pub async fn deliver(
        &self,
        subscription: &Subscription,
        text: &str,
        link: &InviteLink,
    ) -> Result<(), PlatformError> {
        self.platform
            .send_message(
                subscription.user_id.chat(),
                text,
                Some(&presenter::invite_keyboard(link)),
            )
            .await
            .map(|_| ())
    }
}
