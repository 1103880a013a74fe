//! MarkPaidHandler - "I paid" button.

use std::sync::Arc;

use crate::application::pending_proofs::PendingProofRegistry;
use crate::application::presenter;
use crate::domain::foundation::{ChatId, Timestamp};
use crate::domain::inbound::Sender;
use crate::domain::subscription::{PendingProof, Tier};
use crate::ports::ChatPlatform;

#[derive(Debug, Clone)]
pub struct MarkPaidCommand {
    pub sender: Sender,
    pub tier: Tier,
}

/// Records that a receipt is on its way and tells the administrator.
///
/// The proof is always bound to the sender, whatever user id the button
/// data carried.
pub struct MarkPaidHandler {
    proofs: Arc<PendingProofRegistry>,
    platform: Arc<dyn ChatPlatform>,
    admin_chat: ChatId,
}

impl MarkPaidHandler {
    pub fn new(
        proofs: Arc<PendingProofRegistry>,
        platform: Arc<dyn ChatPlatform>,
        admin_chat: ChatId,
    ) -> Self {
        Self {
            proofs,
            platform,
            admin_chat,
        }
    }

    pub async fn handle(&self, cmd: MarkPaidCommand, now: Timestamp) {
        let user = cmd.sender.id;
        self.proofs
            .record(PendingProof::new(user, cmd.tier, cmd.sender.username.clone(), now))
            .await;
        tracing::info!(user_id = %user, tier = cmd.tier.id(), "Payment announced, awaiting receipt");

        let text = presenter::admin_expect_proof(&cmd.sender, cmd.tier);
        if let Err(e) = self.platform.send_message(self.admin_chat, &text, None).await {
            tracing::warn!(user_id = %user, error = %e, "Failed to notify admin of payment");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::recording::{PlatformOp, RecordingPlatform};
    use crate::domain::foundation::UserId;

    #[tokio::test]
    async fn records_proof_and_notifies_admin() {
        let proofs = Arc::new(PendingProofRegistry::default());
        let platform = Arc::new(RecordingPlatform::new());
        let handler = MarkPaidHandler::new(proofs.clone(), platform.clone(), ChatId::new(1));
        let user = UserId::new(8).unwrap();
        let now = Timestamp::now();

        handler
            .handle(
                MarkPaidCommand { sender: Sender::new(user).with_username("bob"), tier: Tier::OneMonth },
                now,
            )
            .await;

        let proof = proofs.take(user, now).await.unwrap();
        assert_eq!(proof.tier, Tier::OneMonth);
        assert_eq!(proof.display_name.as_deref(), Some("bob"));
        assert_eq!(platform.messages_to(ChatId::new(1)).len(), 1);
    }

    #[tokio::test]
    async fn admin_outage_still_records() {
        let proofs = Arc::new(PendingProofRegistry::default());
        let platform = Arc::new(RecordingPlatform::new());
        platform.fail_on(PlatformOp::SendMessage);
        let handler = MarkPaidHandler::new(proofs.clone(), platform, ChatId::new(1));

        handler
            .handle(
                MarkPaidCommand { sender: Sender::new(UserId::new(8).unwrap()), tier: Tier::FourteenDays },
                Timestamp::now(),
            )
            .await;

        assert_eq!(proofs.len().await, 1);
    }
}
