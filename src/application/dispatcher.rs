//! Inbound event dispatcher.
//!
//! Routes every decoded event to its workflow and is the error boundary:
//! nothing a handler returns escapes `dispatch`. Failures are logged and
//! reported to whoever triggered the event, with full detail for the
//! administrator and a generic notice for everyone else.

use std::sync::Arc;

use tracing::Instrument;

use crate::domain::foundation::{ChatId, MessageId, Timestamp};
use crate::domain::inbound::{AdminAction, CallbackAction, Command, InboundEvent, Sender};
use crate::domain::subscription::{SubscriptionError, Tier};
use crate::ports::{ChatPlatform, InlineKeyboard, MessageRef, SubscriptionStore};

use super::backup::BackupExporter;
use super::handlers::{
    ApproveSubscriptionCommand, ApproveSubscriptionHandler, GetSubscriptionStatsHandler,
    HandleJoinRequestCommand, HandleJoinRequestHandler, ListSubscribersHandler, MarkPaidCommand,
    MarkPaidHandler, PurgeExpiredHandler, RemoveSubscriptionCommand, RemoveSubscriptionHandler,
    ResendInvitesHandler, SubmitProofCommand, SubmitProofHandler,
};
use super::invite_issuer::InviteIssuer;
use super::lifecycle_engine::{LifecycleEngine, SweepOutcome};
use super::pending_proofs::PendingProofRegistry;
use super::presenter;
use super::settings::BotSettings;

type Origin = Option<(ChatId, MessageId)>;

pub struct Dispatcher {
    settings: BotSettings,
    store: Arc<dyn SubscriptionStore>,
    platform: Arc<dyn ChatPlatform>,
    engine: Arc<LifecycleEngine>,
    exporter: Arc<BackupExporter>,
    approve: ApproveSubscriptionHandler,
    remove: RemoveSubscriptionHandler,
    join: HandleJoinRequestHandler,
    mark_paid: MarkPaidHandler,
    submit_proof: SubmitProofHandler,
    stats: GetSubscriptionStatsHandler,
    list: ListSubscribersHandler,
    purge: PurgeExpiredHandler,
    resend: ResendInvitesHandler,
}

impl Dispatcher {
    /// Wire the handlers. `engine` and `exporter` are shared with the
    /// scheduler so manual and scheduled runs use the same single-flight
    /// guard.
    pub fn new(
        settings: BotSettings,
        store: Arc<dyn SubscriptionStore>,
        platform: Arc<dyn ChatPlatform>,
        proofs: Arc<PendingProofRegistry>,
        engine: Arc<LifecycleEngine>,
        exporter: Arc<BackupExporter>,
    ) -> Self {
        let admin_chat = settings.admin_chat();
        let group = settings.group_id;
        let issuer = Arc::new(InviteIssuer::new(
            platform.clone(),
            group,
            settings.policy.invite_validity,
        ));

        Self {
            approve: ApproveSubscriptionHandler::new(store.clone(), platform.clone(), issuer.clone()),
            remove: RemoveSubscriptionHandler::new(store.clone(), platform.clone(), group),
            join: HandleJoinRequestHandler::new(store.clone(), platform.clone(), group, admin_chat),
            mark_paid: MarkPaidHandler::new(proofs.clone(), platform.clone(), admin_chat),
            submit_proof: SubmitProofHandler::new(proofs, platform.clone(), admin_chat),
            stats: GetSubscriptionStatsHandler::new(store.clone()),
            list: ListSubscribersHandler::new(store.clone()),
            purge: PurgeExpiredHandler::new(store.clone()),
            resend: ResendInvitesHandler::new(store.clone(), issuer),
            settings,
            store,
            platform,
            engine,
            exporter,
        }
    }

    /// Handle one event to completion. Never fails.
    pub async fn dispatch(&self, event: InboundEvent, now: Timestamp) {
        let sender = event.sender().clone();
        let reply_to = match &event {
            InboundEvent::JoinRequest { .. } => self.settings.admin_chat(),
            _ => sender.id.chat(),
        };
        let span = tracing::info_span!("dispatch", kind = event.kind(), user_id = %sender.id);

        async {
            if let Err(err) = self.route(event, now).await {
                self.report(&sender, reply_to, err).await;
            }
        }
        .instrument(span)
        .await
    }

    async fn route(&self, event: InboundEvent, now: Timestamp) -> Result<(), SubscriptionError> {
        match event {
            InboundEvent::Media {
                sender,
                chat,
                message_id,
                kind,
            } => {
                let cmd = SubmitProofCommand {
                    sender,
                    chat,
                    message_id,
                    kind,
                };
                self.submit_proof.handle(cmd, now).await;
                Ok(())
            }
            InboundEvent::Text { sender, chat, text } => self.on_text(&sender, chat, &text, now).await,
            InboundEvent::Callback {
                id,
                sender,
                action,
                origin,
            } => {
                if let Err(e) = self.platform.answer_callback(&id, None).await {
                    tracing::debug!(error = %e, "Failed to answer callback");
                }
                self.on_callback(&sender, action, origin, now).await
            }
            InboundEvent::JoinRequest { sender, chat } => {
                self.join
                    .handle(HandleJoinRequestCommand { sender, chat })
                    .await?;
                Ok(())
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Text commands
    // ════════════════════════════════════════════════════════════════════════════

    async fn on_text(
        &self,
        sender: &Sender,
        chat: ChatId,
        text: &str,
        now: Timestamp,
    ) -> Result<(), SubscriptionError> {
        let is_admin = self.settings.is_admin(sender.id);
        let command = match Command::parse(text) {
            None => Command::Start,
            Some(Ok(cmd)) if cmd.requires_admin() && !is_admin => {
                return Err(SubscriptionError::unauthorized(sender.id))
            }
            Some(Ok(cmd)) => cmd,
            // Only administrator commands take arguments.
            Some(Err(_)) if !is_admin => return Err(SubscriptionError::unauthorized(sender.id)),
            Some(Err(e)) => return Err(e),
        };

        match command {
            Command::Start => {
                self.say(chat, presenter::welcome_text(), Some(&presenter::main_menu()))
                    .await
            }
            Command::Approve { user_id, tier } => {
                self.approve_and_report(chat, ApproveSubscriptionCommand::for_tier(user_id, tier), now)
                    .await
            }
            Command::AddSub { user_id, tier, days } => {
                self.approve_and_report(chat, ApproveSubscriptionCommand::grant(user_id, tier, days), now)
                    .await
            }
            Command::RemoveSub { user_id } => {
                let result = self.remove.handle(RemoveSubscriptionCommand { user_id }).await?;
                self.say(chat, &presenter::admin_removed(result.user_id, result.revoked), None)
                    .await
            }
            Command::CheckSubs => self.run_sweep(chat, now).await,
            Command::BackupDb => self.run_backup(now).await,
            Command::Admin => {
                self.say(chat, presenter::admin_panel_text(), Some(&presenter::admin_panel()))
                    .await
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Button presses
    // ════════════════════════════════════════════════════════════════════════════

    async fn on_callback(
        &self,
        sender: &Sender,
        action: CallbackAction,
        origin: Origin,
        now: Timestamp,
    ) -> Result<(), SubscriptionError> {
        let requires_admin = matches!(action, CallbackAction::Approve { .. } | CallbackAction::Admin(_));
        if requires_admin && !self.settings.is_admin(sender.id) {
            return Err(SubscriptionError::unauthorized(sender.id));
        }

        match action {
            CallbackAction::ChooseTier => {
                self.show(sender, origin, presenter::tier_menu_text(), Some(&presenter::tier_menu()))
                    .await
            }
            CallbackAction::Back => {
                self.show(sender, origin, presenter::welcome_text(), Some(&presenter::main_menu()))
                    .await
            }
            CallbackAction::MyStatus => {
                let subscription = self.store.get(sender.id).await?;
                let text = presenter::status_text(subscription.as_ref(), now);
                self.show(sender, origin, &text, Some(&presenter::main_menu())).await
            }
            CallbackAction::SelectTier(tier) => self.show_payment(sender, origin, tier).await,
            CallbackAction::Paid { user_id, tier } => {
                if user_id != sender.id {
                    tracing::warn!(claimed = %user_id, "Payment button of another user, using the sender");
                }
                let cmd = MarkPaidCommand {
                    sender: sender.clone(),
                    tier,
                };
                self.mark_paid.handle(cmd, now).await;
                self.show(sender, origin, presenter::awaiting_proof_text(), None).await
            }
            CallbackAction::Approve { user_id, tier } => {
                self.approve_and_report(sender.id.chat(), ApproveSubscriptionCommand::for_tier(user_id, tier), now)
                    .await
            }
            CallbackAction::Admin(admin) => self.on_admin_action(sender.id.chat(), admin, now).await,
            CallbackAction::Unknown(data) => {
                tracing::debug!(data = %data, "Unknown callback data ignored");
                Ok(())
            }
        }
    }

    async fn on_admin_action(
        &self,
        chat: ChatId,
        action: AdminAction,
        now: Timestamp,
    ) -> Result<(), SubscriptionError> {
        match action {
            AdminAction::Stats => {
                let counts = self.stats.handle().await?;
                self.say(chat, &presenter::stats_text(&counts), None).await
            }
            AdminAction::List => {
                let subscriptions = self.list.handle().await?;
                self.say(chat, &presenter::list_text(&subscriptions), None).await
            }
            AdminAction::Sweep => self.run_sweep(chat, now).await,
            AdminAction::Backup => self.run_backup(now).await,
            AdminAction::PurgeExpired => {
                let removed = self.purge.handle().await?;
                self.say(chat, &presenter::purge_text(removed), None).await
            }
            AdminAction::ResendInvites => {
                let report = self.resend.handle(now).await?;
                self.say(chat, &presenter::resend_text(&report), None).await
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Shared steps
    // ════════════════════════════════════════════════════════════════════════════

    async fn show_payment(&self, sender: &Sender, origin: Origin, tier: Tier) -> Result<(), SubscriptionError> {
        let text = presenter::payment_text(sender.id, tier, &self.settings.payment);
        let keyboard = presenter::payment_keyboard(sender.id, tier);
        self.show(sender, origin, &text, Some(&keyboard)).await
    }

    async fn approve_and_report(
        &self,
        chat: ChatId,
        cmd: ApproveSubscriptionCommand,
        now: Timestamp,
    ) -> Result<(), SubscriptionError> {
        let result = self.approve.handle(cmd, now).await?;
        let text = presenter::admin_approved(&result.subscription, &result.invite, result.user_notified);
        self.say(chat, &text, None).await
    }

    async fn run_sweep(&self, chat: ChatId, now: Timestamp) -> Result<(), SubscriptionError> {
        let text = match self.engine.sweep(now).await? {
            SweepOutcome::Completed(report) => presenter::sweep_report_text(&report),
            SweepOutcome::Skipped => presenter::sweep_skipped_text().to_string(),
        };
        self.say(chat, &text, None).await
    }

    async fn run_backup(&self, now: Timestamp) -> Result<(), SubscriptionError> {
        self.exporter.send_backup(now).await?;
        Ok(())
    }

    /// Replace the message that carried the pressed keyboard, or send a new
    /// one when it cannot be edited.
    async fn show(
        &self,
        sender: &Sender,
        origin: Origin,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), SubscriptionError> {
        if let Some((chat, message_id)) = origin {
            match self
                .platform
                .edit_message(MessageRef::new(chat, message_id), text, keyboard)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) => tracing::debug!(error = %e, "Edit failed, sending a new message"),
            }
        }
        self.say(sender.id.chat(), text, keyboard).await
    }

    async fn say(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), SubscriptionError> {
        self.platform.send_message(chat, text, keyboard).await?;
        Ok(())
    }

    async fn report(&self, sender: &Sender, chat: ChatId, err: SubscriptionError) {
        if err.is_user_error() {
            tracing::info!(code = %err.code(), error = %err, "Request rejected");
        } else {
            tracing::error!(code = %err.code(), error = %err, "Request failed");
        }

        let to_admin = chat == self.settings.admin_chat() || self.settings.is_admin(sender.id);
        let text = if err.is_user_error() || to_admin {
            err.message()
        } else {
            presenter::try_later_text().to_string()
        };

        if let Err(e) = self.platform.send_message(chat, &text, None).await {
            tracing::warn!(chat = %chat, error = %e, "Failed to report error");
        }
    }
}
