//! Subscription tier definitions.
//!
//! A tier maps to an access duration and a price. Prices are display-only;
//! payment is confirmed by hand.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::SubscriptionError;

/// Subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// 14 days of access.
    #[serde(rename = "14days")]
    FourteenDays,

    /// One month (30 days) of access.
    #[serde(rename = "1month")]
    OneMonth,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::FourteenDays, Tier::OneMonth];

    /// Identifier used in callback data, commands, and storage.
    pub fn id(&self) -> &'static str {
        match self {
            Tier::FourteenDays => "14days",
            Tier::OneMonth => "1month",
        }
    }

    /// Returns the display name for this tier.
    pub fn display_name(&self) -> &'static str {
        match self {
            Tier::FourteenDays => "14 days",
            Tier::OneMonth => "1 month",
        }
    }

    pub fn duration_days(&self) -> i64 {
        match self {
            Tier::FourteenDays => 14,
            Tier::OneMonth => 30,
        }
    }

    /// Entitlement granted by one payment.
    pub fn duration(&self) -> Duration {
        Duration::days(self.duration_days())
    }

    /// Price in whole hryvnias.
    pub fn price_uah(&self) -> u32 {
        match self {
            Tier::FourteenDays => 500,
            Tier::OneMonth => 800,
        }
    }

    /// Human price label, e.g. `500 UAH`.
    pub fn price_label(&self) -> String {
        format!("{} UAH", self.price_uah())
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Tier {
    type Err = SubscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "14days" => Ok(Tier::FourteenDays),
            "1month" => Ok(Tier::OneMonth),
            other => Err(SubscriptionError::unknown_tier(other)),
        }
    }
}
