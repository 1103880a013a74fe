//! Button-press payloads.
//!
//! Callback data travels through the platform as an opaque string. It is
//! decoded once at the edge into [`CallbackAction`] and encoded back when
//! keyboards are built, so handlers never sniff string prefixes.

use crate::domain::foundation::UserId;
use crate::domain::subscription::Tier;

/// Administrator panel actions (`admin_<action>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminAction {
    Stats,
    List,
    Sweep,
    Backup,
    PurgeExpired,
    ResendInvites,
}

impl AdminAction {
    pub const ALL: [AdminAction; 6] = [
        AdminAction::Stats,
        AdminAction::List,
        AdminAction::Sweep,
        AdminAction::Backup,
        AdminAction::PurgeExpired,
        AdminAction::ResendInvites,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminAction::Stats => "stats",
            AdminAction::List => "list",
            AdminAction::Sweep => "sweep",
            AdminAction::Backup => "backup",
            AdminAction::PurgeExpired => "purge_expired",
            AdminAction::ResendInvites => "resend_invites",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AdminAction::Stats => "📊 Statistics",
            AdminAction::List => "📋 Active subscribers",
            AdminAction::Sweep => "🔄 Run expiry check",
            AdminAction::Backup => "💾 Backup",
            AdminAction::PurgeExpired => "🧹 Purge expired",
            AdminAction::ResendInvites => "📨 Resend invites",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        AdminAction::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

/// Decoded button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// `choose_tariff` - open the tier menu.
    ChooseTier,

    /// `back` - return to the main menu.
    Back,

    /// `my_status` - show the caller's subscription.
    MyStatus,

    /// `tariff_<tier>` - show payment details for a tier.
    SelectTier(Tier),

    /// `paid_<user_id>_<tier>` - user says the transfer is done.
    Paid { user_id: UserId, tier: Tier },

    /// `approve_<user_id>_<tier>` - administrator approves a proof.
    Approve { user_id: UserId, tier: Tier },

    /// `admin_<action>`.
    Admin(AdminAction),

    /// Anything else; acknowledged and ignored.
    Unknown(String),
}

impl CallbackAction {
    /// Decode callback data. Never fails; unrecognized data is `Unknown`.
    pub fn parse(data: &str) -> Self {
        let unknown = || CallbackAction::Unknown(data.to_string());

        match data {
            "choose_tariff" => return CallbackAction::ChooseTier,
            "back" => return CallbackAction::Back,
            "my_status" => return CallbackAction::MyStatus,
            _ => {}
        }

        if let Some(rest) = data.strip_prefix("tariff_") {
            return rest.parse().map(CallbackAction::SelectTier).unwrap_or_else(|_| unknown());
        }
        if let Some(rest) = data.strip_prefix("paid_") {
            return parse_user_tier(rest)
                .map(|(user_id, tier)| CallbackAction::Paid { user_id, tier })
                .unwrap_or_else(unknown);
        }
        if let Some(rest) = data.strip_prefix("approve_") {
            return parse_user_tier(rest)
                .map(|(user_id, tier)| CallbackAction::Approve { user_id, tier })
                .unwrap_or_else(unknown);
        }
        if let Some(rest) = data.strip_prefix("admin_") {
            return AdminAction::parse(rest)
                .map(CallbackAction::Admin)
                .unwrap_or_else(unknown);
        }

        unknown()
    }

    /// Encode back into callback data.
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::ChooseTier => "choose_tariff".to_string(),
            CallbackAction::Back => "back".to_string(),
            CallbackAction::MyStatus => "my_status".to_string(),
            CallbackAction::SelectTier(tier) => format!("tariff_{}", tier.id()),
            CallbackAction::Paid { user_id, tier } => format!("paid_{}_{}", user_id, tier.id()),
            CallbackAction::Approve { user_id, tier } => {
                format!("approve_{}_{}", user_id, tier.id())
            }
            CallbackAction::Admin(action) => format!("admin_{}", action.as_str()),
            CallbackAction::Unknown(raw) => raw.clone(),
        }
    }
}

fn parse_user_tier(s: &str) -> Option<(UserId, Tier)> {
    let (user, tier) = s.split_once('_')?;
    Some((user.parse().ok()?, tier.parse().ok()?))
}
