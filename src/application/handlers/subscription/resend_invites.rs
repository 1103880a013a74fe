//! ResendInvitesHandler - Mass resend of fresh invite links.

use std::sync::Arc;

use crate::application::invite_issuer::InviteIssuer;
use crate::application::presenter;
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{SubscriptionError, SubscriptionStatus};
use crate::ports::SubscriptionStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResendReport {
    pub sent: usize,
    pub failed: Vec<UserId>,
}

/// Sends every active and grace subscriber a new invite link.
///
/// A failure for one user is logged and counted; the batch goes on.
pub struct ResendInvitesHandler {
    store: Arc<dyn SubscriptionStore>,
    issuer: Arc<InviteIssuer>,
}

impl ResendInvitesHandler {
    pub fn new(store: Arc<dyn SubscriptionStore>, issuer: Arc<InviteIssuer>) -> Self {
        Self { store, issuer }
    }

    pub async fn handle(&self, now: Timestamp) -> Result<ResendReport, SubscriptionError> {
        let subscriptions = self.store.list_by_status(&SubscriptionStatus::LIVE).await?;
        let mut report = ResendReport::default();

        for sub in &subscriptions {
            let sent = match self.issuer.mint(sub.user_id, now).await {
                Ok(link) => {
                    let text = presenter::resend_invite_text(sub);
                    self.issuer.deliver(sub, &text, &link).await
                }
                Err(e) => Err(e),
            };
            match sent {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    tracing::warn!(user_id = %sub.user_id, error = %e, "Failed to resend invite");
                    report.failed.push(sub.user_id);
                }
            }
        }

        tracing::info!(sent = report.sent, failed = report.failed.len(), "Invites resent");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::adapters::recording::RecordingPlatform;
    use crate::domain::foundation::ChatId;
    use crate::domain::subscription::Tier;
    use chrono::Duration;

    fn uid(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn resends_to_live_users_and_counts_failures() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let platform = Arc::new(RecordingPlatform::new());
        let now = Timestamp::now();
        for id in [1, 2, 3] {
            store.upsert(uid(id), None, Tier::OneMonth, Duration::days(30), now).await.unwrap();
        }
        store.set_status(uid(3), SubscriptionStatus::Expired, None).await.unwrap();
        platform.fail_chat(ChatId::new(2));
        let issuer = Arc::new(InviteIssuer::new(platform.clone(), ChatId::new(-100), Duration::hours(24)));
        let handler = ResendInvitesHandler::new(store, issuer);

        let report = handler.handle(now).await.unwrap();

        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, vec![uid(2)]);
        assert!(platform.messages_to(ChatId::new(3)).is_empty());
    }
}
