//! Subscription aggregate entity.
//!
//! One record per user, keyed by the platform user id. A user without a
//! record has never been approved and has no access.
//!
//! # Renewal rule
//!
//! Renewing an `active` subscription whose period has not ended extends
//! from `period_end`, so no paid time is lost. Any other renewal (grace,
//! expired, or an active record the sweep has not caught up with yet)
//! starts fresh from `now`.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

use super::{SubscriptionStatus, Tier};

/// Subscription aggregate - a user's paid access window.
///
/// # Invariants
///
/// - `user_id` is unique (upsert, never append)
/// - `period_end` is the authoritative "access until" for active and grace
/// - `period_start <= period_end`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: UserId,

    /// Best-effort platform handle, informational only.
    pub display_name: Option<String>,

    pub tier: Tier,

    pub period_start: Timestamp,

    pub period_end: Timestamp,

    pub status: SubscriptionStatus,

    /// When the user was first approved.
    pub created_at: Timestamp,
}

impl Subscription {
    /// Create a freshly activated subscription.
    pub fn activate(
        user_id: UserId,
        display_name: Option<String>,
        tier: Tier,
        extend_by: Duration,
        now: Timestamp,
    ) -> Self {
        Self {
            user_id,
            display_name,
            tier,
            period_start: now,
            period_end: now.plus(extend_by),
            status: SubscriptionStatus::Active,
            created_at: now,
        }
    }

    /// Point a renewal extends from.
    pub fn renewal_base(&self, now: Timestamp) -> Timestamp {
        if self.status == SubscriptionStatus::Active && self.period_end > now {
            self.period_end
        } else {
            now
        }
    }

    /// Apply a renewal. Valid from every stored status.
    pub fn renew(
        &mut self,
        display_name: Option<String>,
        tier: Tier,
        extend_by: Duration,
        now: Timestamp,
    ) {
        let base = self.renewal_base(now);
        if base == now {
            self.period_start = now;
        }
        self.period_end = base.plus(extend_by);
        self.status = SubscriptionStatus::Active;
        self.tier = tier;
        if display_name.is_some() {
            self.display_name = display_name;
        }
    }

    /// Eligibility for group membership.
    pub fn has_access(&self) -> bool {
        self.status.has_access()
    }

    /// Time left until `period_end`; negative once it has passed.
    pub fn remaining(&self, now: Timestamp) -> Duration {
        self.period_end.duration_since(&now)
    }

    /// `@handle` when known, otherwise the numeric id.
    pub fn label(&self) -> String {
        match &self.display_name {
            Some(name) if !name.is_empty() => format!("@{}", name),
            _ => format!("id {}", self.user_id),
        }
    }
}
