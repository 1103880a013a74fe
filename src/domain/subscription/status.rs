//! Subscription status state machine.
//!
//! Defines all possible subscription states and valid transitions
//! according to the access lifecycle.

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Never approved. Users without a stored row are treated as pending.
    Pending,

    /// Paid through `period_end`.
    Active,

    /// Nominal period ended; access continues until the extended `period_end`.
    Grace,

    /// Access closed. Only a renewal brings the user back.
    Expired,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 4] = [
        SubscriptionStatus::Pending,
        SubscriptionStatus::Active,
        SubscriptionStatus::Grace,
        SubscriptionStatus::Expired,
    ];

    /// Statuses a sweep has to look at.
    pub const LIVE: [SubscriptionStatus; 2] = [SubscriptionStatus::Active, SubscriptionStatus::Grace];

    /// Returns true if this status makes the user eligible for group membership.
    pub fn has_access(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Grace)
    }

    /// Storage and log representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Grace => "grace",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(SubscriptionStatus::Pending),
            "active" => Ok(SubscriptionStatus::Active),
            "grace" => Ok(SubscriptionStatus::Grace),
            "expired" => Ok(SubscriptionStatus::Expired),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            (Pending, Active)
                | (Active, Grace)
                | (Active, Active) // Renewal
                | (Grace, Expired)
                | (Grace, Active) // Renewal during grace
                | (Expired, Active) // Renewal after expiry
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Pending => vec![Active],
            Active => vec![Grace, Active],
            Grace => vec![Expired, Active],
            Expired => vec![Active],
        }
    }
}
