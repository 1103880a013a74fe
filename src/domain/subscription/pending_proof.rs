//! Pending proof of payment.
//!
//! Short-lived marker between "user pressed I paid" and "user sent the
//! receipt". Not persisted; a restart drops in-flight proofs.

use chrono::Duration;

use crate::domain::foundation::{Timestamp, UserId};

use super::Tier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingProof {
    pub user_id: UserId,
    pub tier: Tier,
    pub display_name: Option<String>,
    pub submitted_at: Timestamp,
}

impl PendingProof {
    pub fn new(user_id: UserId, tier: Tier, display_name: Option<String>, now: Timestamp) -> Self {
        Self {
            user_id,
            tier,
            display_name,
            submitted_at: now,
        }
    }

    /// A proof older than `ttl` no longer matches incoming media.
    pub fn is_stale(&self, now: Timestamp, ttl: Duration) -> bool {
        now.duration_since(&self.submitted_at) > ttl
    }
}
