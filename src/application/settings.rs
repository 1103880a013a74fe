//! Runtime settings shared by the workflows.

use crate::domain::foundation::{ChatId, UserId};
use crate::domain::subscription::LifecyclePolicy;

/// Bank transfer details shown on the payment screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    pub recipient: String,
    pub iban: String,
    pub bank: String,
}

/// Identities and policy the bot operates with.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// The single administrator allowed to run admin commands.
    pub admin_id: UserId,

    /// The managed group.
    pub group_id: ChatId,

    pub payment: PaymentDetails,

    pub policy: LifecyclePolicy,
}

impl BotSettings {
    pub fn is_admin(&self, user: UserId) -> bool {
        user == self.admin_id
    }

    pub fn admin_chat(&self) -> ChatId {
        self.admin_id.chat()
    }
}
