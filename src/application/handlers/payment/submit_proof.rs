//! SubmitProofHandler - receipt attachments sent by users.

use std::sync::Arc;

use crate::application::pending_proofs::PendingProofRegistry;
use crate::application::presenter;
use crate::domain::foundation::{ChatId, MessageId, Timestamp};
use crate::domain::inbound::{MediaKind, Sender};
use crate::domain::subscription::Tier;
use crate::ports::ChatPlatform;

#[derive(Debug, Clone)]
pub struct SubmitProofCommand {
    pub sender: Sender,
    pub chat: ChatId,
    pub message_id: MessageId,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofOutcome {
    /// Receipt is with the administrator.
    Forwarded { tier: Tier },
    /// No pending proof; the user got guidance.
    Unsolicited,
    /// Forwarding failed; the pending proof was kept for another try.
    ForwardFailed,
}

pub struct SubmitProofHandler {
    proofs: Arc<PendingProofRegistry>,
    platform: Arc<dyn ChatPlatform>,
    admin_chat: ChatId,
}

impl SubmitProofHandler {
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

    pub async fn handle(&self, cmd: SubmitProofCommand, now: Timestamp) -> ProofOutcome {
        let user = cmd.sender.id;

        let Some(proof) = self.proofs.take(user, now).await else {
            tracing::debug!(user_id = %user, kind = cmd.kind.as_str(), "Media without pending proof");
            self.reply(cmd.chat, presenter::unsolicited_media_text()).await;
            return ProofOutcome::Unsolicited;
        };

        if let Err(e) = self
            .platform
            .forward_message(self.admin_chat, cmd.chat, cmd.message_id)
            .await
        {
            tracing::error!(user_id = %user, error = %e, "Failed to forward receipt");
            self.proofs.record(proof).await;
            self.reply(cmd.chat, presenter::proof_forward_failed_text()).await;
            return ProofOutcome::ForwardFailed;
        }

        let caption = presenter::admin_proof_caption(&cmd.sender, proof.tier);
        let keyboard = presenter::approve_keyboard(user, proof.tier);
        if let Err(e) = self
            .platform
            .send_message(self.admin_chat, &caption, Some(&keyboard))
            .await
        {
            tracing::error!(user_id = %user, error = %e, "Failed to send approval prompt");
        }

        tracing::info!(user_id = %user, tier = proof.tier.id(), kind = cmd.kind.as_str(), "Receipt forwarded");
        self.reply(cmd.chat, presenter::proof_received_text()).await;
        ProofOutcome::Forwarded { tier: proof.tier }
    }

    async fn reply(&self, chat: ChatId, text: &str) {
        if let Err(e) = self.platform.send_message(chat, text, None).await {
            tracing::warn!(chat = %chat, error = %e, "Failed to reply to user");
        }
    }
}
