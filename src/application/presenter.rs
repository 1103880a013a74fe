//! User-facing texts and keyboards.
//!
//! Every message the bot sends is built here so workflows only decide
//! *what* to say.

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::inbound::{AdminAction, CallbackAction, Sender};
use crate::domain::subscription::{Subscription, SubscriptionStatus, Tier};
use crate::ports::{InlineButton, InlineKeyboard, InviteLink};

use super::handlers::{ResendReport, StatusCounts};
use super::lifecycle_engine::SweepReport;
use super::settings::PaymentDetails;

/// Rows shown by the subscriber list.
pub const LIST_LIMIT: usize = 50;

/// Reference the user puts in the transfer comment.
pub fn payment_reference(user: UserId, tier: Tier) -> String {
    format!("Subscription {}-{}", user, tier.id())
}

// ════════════════════════════════════════════════════════════════════════════════
// Menus
// ════════════════════════════════════════════════════════════════════════════════

pub fn welcome_text() -> &'static str {
    "👋 Welcome to the club!\n\n\
     Membership gives you access to the private group.\n\
     Choose a tier to see payment details, or check your current status."
}

pub fn main_menu() -> InlineKeyboard {
    InlineKeyboard::new()
        .button(InlineButton::action("💳 Choose a tier", &CallbackAction::ChooseTier))
        .button(InlineButton::action("📅 My status", &CallbackAction::MyStatus))
}

pub fn tier_menu_text() -> &'static str {
    "Choose a tier:"
}

pub fn tier_menu() -> InlineKeyboard {
    Tier::ALL
        .iter()
        .fold(InlineKeyboard::new(), |kb, tier| {
            kb.button(InlineButton::action(
                format!("{} · {}", tier.display_name(), tier.price_label()),
                &CallbackAction::SelectTier(*tier),
            ))
        })
        .button(InlineButton::action("⬅️ Back", &CallbackAction::Back))
}

pub fn payment_text(user: UserId, tier: Tier, payment: &PaymentDetails) -> String {
    format!(
        "Tier: {}\nAmount: {}\n\n\
         Transfer the amount to:\n\
         Recipient: {}\n\
         IBAN: {}\n\
         Bank: {}\n\n\
         Payment reference: {}\n\n\
         After paying, press \"I paid\" and send a screenshot or file of the receipt.",
        tier.display_name(),
        tier.price_label(),
        payment.recipient,
        payment.iban,
        payment.bank,
        payment_reference(user, tier),
    )
}

pub fn payment_keyboard(user: UserId, tier: Tier) -> InlineKeyboard {
    InlineKeyboard::new()
        .button(InlineButton::action(
            "✅ I paid",
            &CallbackAction::Paid { user_id: user, tier },
        ))
        .button(InlineButton::action("⬅️ Back", &CallbackAction::ChooseTier))
}

pub fn status_text(subscription: Option<&Subscription>, now: Timestamp) -> String {
    match subscription {
        Some(sub) if sub.has_access() => {
            let mut text = format!(
                "📅 Status: {}\nTier: {}\nAccess until: {}",
                sub.status,
                sub.tier.display_name(),
                sub.period_end.display_short()
            );
            if sub.status == SubscriptionStatus::Grace {
                text.push_str("\n\n⏳ You are in the grace period. Renew to keep access.");
            } else {
                let days = sub.remaining(now).num_days().max(0);
                text.push_str(&format!("\nDays left: {}", days));
            }
            text
        }
        Some(sub) => format!(
            "📅 Status: {}\nYour subscription is not active. Choose a tier to renew.",
            sub.status
        ),
        None => "📅 You have no active subscription yet.".to_string(),
    }
}

pub fn try_later_text() -> &'static str {
    "⚠️ Something went wrong. Please try again later."
}

// ════════════════════════════════════════════════════════════════════════════════
// Proof of payment
// ════════════════════════════════════════════════════════════════════════════════

pub fn awaiting_proof_text() -> &'static str {
    "Thank you! Now send a screenshot, photo, or document of the payment receipt in this chat."
}

pub fn admin_expect_proof(sender: &Sender, tier: Tier) -> String {
    format!(
        "🔔 {} (id {}) says they paid for {} ({}). Waiting for the receipt.",
        sender.label(),
        sender.id,
        tier.display_name(),
        tier.price_label()
    )
}

pub fn proof_received_text() -> &'static str {
    "📨 Receipt received. The administrator will check it shortly, and you will get your invite link here."
}

pub fn unsolicited_media_text() -> &'static str {
    "To submit a receipt, choose a tier first and press \"I paid\"."
}

pub fn proof_forward_failed_text() -> &'static str {
    "⚠️ Could not pass your receipt to the administrator. Please send it again in a few minutes."
}

pub fn admin_proof_caption(sender: &Sender, tier: Tier) -> String {
    format!(
        "🧾 Receipt from {} (id {})\nTier: {} ({})\nReference: {}",
        sender.label(),
        sender.id,
        tier.display_name(),
        tier.price_label(),
        payment_reference(sender.id, tier)
    )
}

pub fn approve_keyboard(user: UserId, tier: Tier) -> InlineKeyboard {
    InlineKeyboard::new().button(InlineButton::action(
        "✅ Approve",
        &CallbackAction::Approve { user_id: user, tier },
    ))
}

// ════════════════════════════════════════════════════════════════════════════════
// Access
// ════════════════════════════════════════════════════════════════════════════════

pub fn invite_text(subscription: &Subscription) -> String {
    format!(
        "✅ Payment confirmed!\n\nAccess until: {}\n\n\
         Use the button below to request to join. The link is personal, \
         valid for 24 hours, and admits one person.",
        subscription.period_end.display_short()
    )
}

pub fn invite_keyboard(link: &InviteLink) -> InlineKeyboard {
    InlineKeyboard::new().button(InlineButton::url("🚪 Join the group", link.url.clone()))
}

pub fn resend_invite_text(subscription: &Subscription) -> String {
    format!(
        "🔗 Here is a fresh invite link. Your access is valid until {}.",
        subscription.period_end.display_short()
    )
}

pub fn admin_approved(subscription: &Subscription, link: &InviteLink, user_notified: bool) -> String {
    let mut text = format!(
        "✅ {} approved: {} until {} ({}).",
        subscription.label(),
        subscription.tier.display_name(),
        subscription.period_end.display_short(),
        subscription.status
    );
    if !user_notified {
        text.push_str(&format!(
            "\n⚠️ Could not message the user. Send them this link yourself:\n{}",
            link.url
        ));
    }
    text
}

pub fn admin_removed(user: UserId, revoked: bool) -> String {
    if revoked {
        format!("🗑 Subscription of {} deleted and the user was removed from the group.", user)
    } else {
        format!(
            "🗑 Subscription of {} deleted, but removing the user from the group failed. Check manually.",
            user
        )
    }
}

pub fn join_approved_text() -> &'static str {
    "🎉 Welcome aboard! Your request to join the group was approved."
}

pub fn admin_unauthorized_join(sender: &Sender) -> String {
    format!(
        "🚫 Join request declined: {} (id {}) has no active subscription.",
        sender.label(),
        sender.id
    )
}

// ════════════════════════════════════════════════════════════════════════════════
// Lifecycle notices
// ════════════════════════════════════════════════════════════════════════════════

pub fn grace_started_text(subscription: &Subscription) -> String {
    format!(
        "⏳ Your subscription has ended. You keep access during a grace period until {}.\n\
         Renew now so you don't lose access.",
        subscription.period_end.display_short()
    )
}

pub fn last_day_text(subscription: &Subscription) -> String {
    format!(
        "⚠️ Last day of the grace period! Access closes at {}. Renew to stay in the group.",
        subscription.period_end.display_short()
    )
}

pub fn access_closed_text() -> &'static str {
    "🔒 Your access to the group has been closed. You can come back any time by choosing a tier again."
}

pub fn admin_revoke_failed(subscription: &Subscription, error: &str) -> String {
    format!(
        "⚠️ Could not remove {} from the group: {}\nThe subscription is marked expired. Remove them manually.",
        subscription.label(),
        error
    )
}

// ════════════════════════════════════════════════════════════════════════════════
// Administrator
// ════════════════════════════════════════════════════════════════════════════════

pub fn admin_panel_text() -> &'static str {
    "🛠 Administrator panel"
}

pub fn admin_panel() -> InlineKeyboard {
    AdminAction::ALL
        .iter()
        .fold(InlineKeyboard::new(), |kb, action| {
            kb.button(InlineButton::action(action.label(), &CallbackAction::Admin(*action)))
        })
}

pub fn stats_text(counts: &StatusCounts) -> String {
    format!(
        "📊 Subscriptions\nActive: {}\nGrace: {}\nExpired: {}\nTotal: {}",
        counts.active, counts.grace, counts.expired, counts.total
    )
}

pub fn list_text(subscriptions: &[Subscription]) -> String {
    if subscriptions.is_empty() {
        return "📋 No active subscribers.".to_string();
    }
    let mut text = format!("📋 Active subscribers ({}):\n", subscriptions.len());
    for sub in subscriptions.iter().take(LIST_LIMIT) {
        text.push_str(&format!(
            "\n{} · {} · {} · until {}",
            sub.label(),
            sub.tier.id(),
            sub.status,
            sub.period_end.display_short()
        ));
    }
    if subscriptions.len() > LIST_LIMIT {
        text.push_str(&format!("\n…and {} more", subscriptions.len() - LIST_LIMIT));
    }
    text
}

pub fn sweep_report_text(report: &SweepReport) -> String {
    format!(
        "🔄 Expiry check done\nScanned: {}\nEntered grace: {}\nReminded: {}\nExpired: {}\nRemoval failures: {}\nSkipped (changed meanwhile): {}",
        report.scanned,
        report.entered_grace,
        report.reminded,
        report.expired,
        report.revoke_failures.len(),
        report.conflicts
    )
}

pub fn sweep_skipped_text() -> &'static str {
    "🔄 An expiry check is already running."
}

pub fn purge_text(removed: u64) -> String {
    format!("🧹 Removed {} expired subscriptions.", removed)
}

pub fn resend_text(report: &ResendReport) -> String {
    format!(
        "📨 Invites resent: {}\nFailed: {}",
        report.sent,
        report.failed.len()
    )
}

pub fn backup_caption(rows: usize, at: Timestamp) -> String {
    format!("💾 Backup of {} subscriptions, {}", rows, at.display_short())
}
