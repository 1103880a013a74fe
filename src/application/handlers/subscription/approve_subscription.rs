//! ApproveSubscriptionHandler - Command handler for granting access.
//!
//! Used for both the receipt approval button and the direct `addsub` grant.

use std::sync::Arc;

use chrono::Duration;

use crate::application::invite_issuer::InviteIssuer;
use crate::application::presenter;
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{Subscription, SubscriptionError, Tier};
use crate::ports::{ChatPlatform, InviteLink, SubscriptionStore};

/// Command to approve (or renew) a subscription.
#[derive(Debug, Clone)]
pub struct ApproveSubscriptionCommand {
    pub user_id: UserId,
    pub tier: Tier,
    /// Length of the extension; the tier duration unless granted directly.
    pub extend_by: Duration,
    /// Known handle, if any. Looked up on the platform when absent.
    pub display_name: Option<String>,
}

impl ApproveSubscriptionCommand {
    /// Approval for one period of `tier`.
    pub fn for_tier(user_id: UserId, tier: Tier) -> Self {
        Self {
            user_id,
            tier,
            extend_by: tier.duration(),
            display_name: None,
        }
    }

    /// Direct grant of `days` under `tier`.
    pub fn grant(user_id: UserId, tier: Tier, days: i64) -> Self {
        Self {
            user_id,
            tier,
            extend_by: Duration::days(days),
            display_name: None,
        }
    }
}

/// Result of a successful approval.
#[derive(Debug, Clone)]
pub struct ApproveSubscriptionResult {
    pub subscription: Subscription,
    pub invite: InviteLink,
    /// False when the invite could not be messaged to the user.
    pub user_notified: bool,
}

/// Handler for approving subscriptions.
///
/// The invite is minted before anything is written, so a platform failure
/// leaves no record behind. A store failure after minting is reported as
/// an inconsistency carrying the orphan link.
pub struct ApproveSubscriptionHandler {
    store: Arc<dyn SubscriptionStore>,
    platform: Arc<dyn ChatPlatform>,
    issuer: Arc<InviteIssuer>,
}

impl ApproveSubscriptionHandler {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        platform: Arc<dyn ChatPlatform>,
        issuer: Arc<InviteIssuer>,
    ) -> Self {
        Self {
            store,
            platform,
            issuer,
        }
    }

    pub async fn handle(
        &self,
        cmd: ApproveSubscriptionCommand,
        now: Timestamp,
    ) -> Result<ApproveSubscriptionResult, SubscriptionError> {
        // 1. Mint the invite; nothing is saved if this fails
        let invite = self
            .issuer
            .mint(cmd.user_id, now)
            .await
            .map_err(|e| SubscriptionError::invite_failed(cmd.user_id, e.to_string()))?;

        // 2. Resolve the handle, best effort
        let display_name = match cmd.display_name {
            Some(name) => Some(name),
            None => self.lookup_username(cmd.user_id).await,
        };

        // 3. Persist the renewal
        let subscription = self
            .store
            .upsert(cmd.user_id, display_name, cmd.tier, cmd.extend_by, now)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %cmd.user_id, error = %e, "Invite created but subscription not saved");
                SubscriptionError::inconsistent(
                    cmd.user_id,
                    format!(
                        "invite link {} was created but the subscription was not saved ({})",
                        invite.url, e
                    ),
                )
            })?;

        tracing::info!(
            user_id = %cmd.user_id,
            tier = cmd.tier.id(),
            period_end = %subscription.period_end.to_storage_string(),
            "Subscription approved"
        );

        // 4. Hand the link to the user
        let text = presenter::invite_text(&subscription);
        let user_notified = match self.issuer.deliver(&subscription, &text, &invite).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(user_id = %cmd.user_id, error = %e, "Failed to deliver invite link");
                false
            }
        };

        Ok(ApproveSubscriptionResult {
            subscription,
            invite,
            user_notified,
        })
    }

    async fn lookup_username(&self, user: UserId) -> Option<String> {
        match self.platform.fetch_username(user).await {
            Ok(name) => name,
            Err(e) => {
                tracing::debug!(user_id = %user, error = %e, "Username lookup failed");
                None
            }
        }
    }
}
