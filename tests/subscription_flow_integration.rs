//! Integration tests for the full subscription journey.
//!
//! Drives the dispatcher with inbound events the way the webhook does:
//! 1. User picks a tier and announces the payment
//! 2. User sends the receipt, which reaches the administrator
//! 3. Administrator approves, user gets an invite link
//! 4. Join request is approved; after expiry it is declined
//!
//! Uses the in-memory store and the recording platform.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use club_gate::adapters::recording::{PlatformCall, PlatformOp, RecordingPlatform};
use club_gate::adapters::InMemorySubscriptionStore;
use club_gate::application::{
    presenter, BackupExporter, BotSettings, Dispatcher, LifecycleEngine, PaymentDetails,
    PendingProofRegistry,
};
use club_gate::domain::foundation::{ChatId, MessageId, Timestamp, UserId};
use club_gate::domain::inbound::{AdminAction, CallbackAction, InboundEvent, MediaKind, Sender};
use club_gate::domain::subscription::{LifecyclePolicy, SubscriptionError, SubscriptionStatus, Tier};
use club_gate::ports::SubscriptionStore;

// =============================================================================
// Test Infrastructure
// =============================================================================

const ADMIN: i64 = 377139113;
const GROUP: i64 = -1001234567890;
const USER: i64 = 555;

struct Bot {
    store: Arc<InMemorySubscriptionStore>,
    platform: Arc<RecordingPlatform>,
    dispatcher: Dispatcher,
}

impl Bot {
    fn new() -> Self {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let platform = Arc::new(RecordingPlatform::new());
        let settings = BotSettings {
            admin_id: UserId::new(ADMIN).unwrap(),
            group_id: ChatId::new(GROUP),
            payment: PaymentDetails {
                recipient: "Olena Kovalenko".to_string(),
                iban: "UA213223130000026007233566001".to_string(),
                bank: "PrivatBank".to_string(),
            },
            policy: LifecyclePolicy::default(),
        };
        let engine = Arc::new(LifecycleEngine::new(
            store.clone(),
            platform.clone(),
            settings.group_id,
            settings.admin_chat(),
            settings.policy,
        ));
        let exporter = Arc::new(BackupExporter::new(
            store.clone(),
            platform.clone(),
            settings.admin_chat(),
        ));
        let dispatcher = Dispatcher::new(
            settings,
            store.clone(),
            platform.clone(),
            Arc::new(PendingProofRegistry::default()),
            engine,
            exporter,
        );
        Self {
            store,
            platform,
            dispatcher,
        }
    }

    async fn send(&self, event: InboundEvent, now: Timestamp) {
        self.dispatcher.dispatch(event, now).await;
    }

    async fn status(&self, id: i64) -> Option<SubscriptionStatus> {
        self.store
            .get(UserId::new(id).unwrap())
            .await
            .unwrap()
            .map(|s| s.status)
    }
}

fn t0() -> Timestamp {
    Timestamp::from_datetime(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
}

fn sender(id: i64) -> Sender {
    Sender::new(UserId::new(id).unwrap()).with_username(format!("user{}", id))
}

fn text(id: i64, body: &str) -> InboundEvent {
    InboundEvent::Text {
        sender: sender(id),
        chat: ChatId::new(id),
        text: body.to_string(),
    }
}

fn press(id: i64, action: CallbackAction) -> InboundEvent {
    InboundEvent::Callback {
        id: format!("cb-{}", id),
        sender: sender(id),
        action,
        origin: Some((ChatId::new(id), MessageId::new(1))),
    }
}

fn receipt(id: i64) -> InboundEvent {
    InboundEvent::Media {
        sender: sender(id),
        chat: ChatId::new(id),
        message_id: MessageId::new(99),
        kind: MediaKind::Photo,
    }
}

fn join(id: i64) -> InboundEvent {
    InboundEvent::JoinRequest {
        sender: sender(id),
        chat: ChatId::new(GROUP),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn paid_user_gets_in_and_is_removed_after_grace() {
    let bot = Bot::new();
    let user = UserId::new(USER).unwrap();
    let tier = Tier::FourteenDays;

    // Tier selection and payment announcement
    bot.send(text(USER, "/start"), t0()).await;
    bot.send(press(USER, CallbackAction::ChooseTier), t0()).await;
    bot.send(press(USER, CallbackAction::SelectTier(tier)), t0()).await;
    bot.send(press(USER, CallbackAction::Paid { user_id: user, tier }), t0()).await;

    // Receipt reaches the administrator with an approve button
    bot.send(receipt(USER), t0()).await;
    let forwarded = bot.platform.calls().into_iter().any(|c| {
        matches!(c, PlatformCall::ForwardMessage { to, from, .. }
            if to == ChatId::new(ADMIN) && from == ChatId::new(USER))
    });
    assert!(forwarded);
    assert!(bot.platform.calls().into_iter().any(|c| matches!(
        c,
        PlatformCall::SendMessage { chat, keyboard: Some(kb), .. }
            if chat == ChatId::new(ADMIN) && kb == presenter::approve_keyboard(user, tier)
    )));

    // Approval
    bot.send(press(ADMIN, CallbackAction::Approve { user_id: user, tier }), t0()).await;
    assert_eq!(bot.status(USER).await, Some(SubscriptionStatus::Active));
    assert_eq!(bot.platform.count(PlatformOp::CreateInviteLink), 1);

    // Join request with the link
    bot.send(join(USER), t0().add_hours(1)).await;
    assert_eq!(bot.platform.count(PlatformOp::ApproveJoinRequest), 1);

    // Lifecycle: grace, then expiry with exactly one removal
    bot.send(text(ADMIN, "/checksubs"), t0().add_days(14).add_hours(1)).await;
    assert_eq!(bot.status(USER).await, Some(SubscriptionStatus::Grace));
    bot.send(text(ADMIN, "/checksubs"), t0().add_days(16).add_hours(2)).await;
    bot.send(text(ADMIN, "/checksubs"), t0().add_days(16).add_hours(3)).await;
    assert_eq!(bot.status(USER).await, Some(SubscriptionStatus::Expired));
    assert_eq!(bot.platform.revocations(), vec![user]);

    // Coming back through the old link is refused
    bot.send(join(USER), t0().add_days(17)).await;
    assert_eq!(bot.platform.count(PlatformOp::DeclineJoinRequest), 1);
}

#[tokio::test]
async fn receipt_without_payment_announcement_is_not_forwarded() {
    let bot = Bot::new();

    bot.send(receipt(USER), t0()).await;

    assert_eq!(bot.platform.count(PlatformOp::ForwardMessage), 0);
    assert_eq!(
        bot.platform.messages_to(ChatId::new(USER)),
        vec![presenter::unsolicited_media_text()]
    );
}

#[tokio::test]
async fn stranger_join_request_is_declined_and_reported() {
    let bot = Bot::new();

    bot.send(join(USER), t0()).await;

    assert_eq!(bot.platform.count(PlatformOp::DeclineJoinRequest), 1);
    let admin = bot.platform.messages_to(ChatId::new(ADMIN));
    assert_eq!(admin.len(), 1);
    assert!(admin[0].contains("@user555"));
}

#[tokio::test]
async fn renewal_before_end_extends_from_current_end() {
    let bot = Bot::new();

    bot.send(text(ADMIN, "/approve 555 1month"), t0()).await;
    bot.send(text(ADMIN, "/approve 555 14days"), t0().add_days(5)).await;

    let sub = bot.store.get(UserId::new(USER).unwrap()).await.unwrap().unwrap();
    assert_eq!(sub.period_end, t0().add_days(44));
    assert_eq!(sub.tier, Tier::FourteenDays);
}

#[tokio::test]
async fn admin_panel_actions_work_end_to_end() {
    let bot = Bot::new();
    bot.send(text(ADMIN, "/addsub 555 1month 30"), t0()).await;
    bot.send(text(ADMIN, "/addsub 556 14days 14"), t0()).await;
    bot.platform.clear_calls();

    bot.send(text(ADMIN, "/admin"), t0()).await;
    bot.send(press(ADMIN, CallbackAction::Admin(AdminAction::Stats)), t0()).await;
    bot.send(press(ADMIN, CallbackAction::Admin(AdminAction::List)), t0()).await;
    bot.send(press(ADMIN, CallbackAction::Admin(AdminAction::ResendInvites)), t0()).await;
    bot.send(press(ADMIN, CallbackAction::Admin(AdminAction::Backup)), t0()).await;

    let admin = bot.platform.messages_to(ChatId::new(ADMIN));
    assert_eq!(admin[0], presenter::admin_panel_text());
    assert!(admin[1].contains("Active: 2"));
    assert!(admin[2].contains("id 555"));
    assert!(admin[3].contains("Invites resent: 2"));
    assert_eq!(bot.platform.count(PlatformOp::SendDocument), 1);
}

#[tokio::test]
async fn removesub_deletes_and_kicks() {
    let bot = Bot::new();
    bot.send(text(ADMIN, "/addsub 555 1month 30"), t0()).await;

    bot.send(text(ADMIN, "/removesub 555"), t0()).await;

    assert_eq!(bot.status(USER).await, None);
    assert_eq!(bot.platform.revocations(), vec![UserId::new(USER).unwrap()]);
}

#[tokio::test]
async fn users_cannot_run_admin_commands() {
    let bot = Bot::new();

    for command in ["/approve 555 1month", "/addsub 555 1month 30", "/removesub 555", "/checksubs", "/backupdb", "/admin"] {
        bot.send(text(USER, command), t0()).await;
    }

    assert_eq!(bot.status(USER).await, None);
    assert_eq!(bot.platform.count(PlatformOp::SendDocument), 0);
    assert_eq!(bot.platform.count(PlatformOp::CreateInviteLink), 0);
    let denial = SubscriptionError::unauthorized(UserId::new(USER).unwrap()).message();
    assert!(bot
        .platform
        .messages_to(ChatId::new(USER))
        .iter()
        .all(|m| *m == denial));
}
