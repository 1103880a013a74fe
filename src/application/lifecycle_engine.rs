//! Lifecycle engine.
//!
//! Drives the `active -> grace -> expired` transitions against wall-clock
//! time, notifies users, and removes expired members from the group.
//!
//! # Guarantees
//!
//! - **Single-flight**: an overlapping sweep returns `SweepOutcome::Skipped`
//! - **At most once per transition**: rows move with a compare-and-set, so a
//!   second sweep, or a renewal in between, never re-extends grace or kicks
//!   a user twice
//! - **Batch survives failures**: a platform or store error for one user is
//!   logged and the sweep carries on with the next

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::foundation::{ChatId, DomainError, StateMachine, Timestamp, UserId};
use crate::domain::subscription::{
    LifecycleAction, LifecyclePolicy, Subscription, SubscriptionStatus,
};
use crate::ports::{ChatPlatform, SubscriptionStore};

use super::presenter;

/// Counters of one completed sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub entered_grace: usize,
    pub reminded: usize,
    pub expired: usize,
    /// Rows that changed between read and write; left for the next sweep.
    pub conflicts: usize,
    /// Users marked expired whose removal from the group failed.
    pub revoke_failures: Vec<UserId>,
    /// Users whose row could not be updated.
    pub store_failures: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed(SweepReport),
    /// Another sweep was already running.
    Skipped,
}

pub struct LifecycleEngine {
    store: Arc<dyn SubscriptionStore>,
    platform: Arc<dyn ChatPlatform>,
    group: ChatId,
    admin_chat: ChatId,
    policy: LifecyclePolicy,
    running: Mutex<()>,
    /// `(user, period_end)` pairs already sent the last-day reminder.
    reminded: Mutex<HashSet<(UserId, Timestamp)>>,
}

impl LifecycleEngine {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        platform: Arc<dyn ChatPlatform>,
        group: ChatId,
        admin_chat: ChatId,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            store,
            platform,
            group,
            admin_chat,
            policy,
            running: Mutex::new(()),
            reminded: Mutex::new(HashSet::new()),
        }
    }

    /// Evaluate every active and grace subscription at `now`.
    ///
    /// Only failing to read the batch is an error; per-user failures end up
    /// in the report.
    pub async fn sweep(&self, now: Timestamp) -> Result<SweepOutcome, DomainError> {
        let Ok(_running) = self.running.try_lock() else {
            tracing::info!("Sweep already in progress, skipping");
            return Ok(SweepOutcome::Skipped);
        };

        let subscriptions = self.store.list_by_status(&SubscriptionStatus::LIVE).await?;
        self.forget_old_reminders(now).await;

        let mut report = SweepReport {
            scanned: subscriptions.len(),
            ..SweepReport::default()
        };

        for sub in &subscriptions {
            match self.policy.evaluate(sub, now) {
                LifecycleAction::EnterGrace { period_end } => {
                    self.enter_grace(sub, period_end, &mut report).await
                }
                LifecycleAction::RemindLastDay => self.remind_last_day(sub, &mut report).await,
                LifecycleAction::Expire => self.expire(sub, &mut report).await,
                LifecycleAction::Idle => {}
            }
        }

        tracing::info!(
            scanned = report.scanned,
            entered_grace = report.entered_grace,
            reminded = report.reminded,
            expired = report.expired,
            conflicts = report.conflicts,
            revoke_failures = report.revoke_failures.len(),
            "Sweep completed"
        );
        Ok(SweepOutcome::Completed(report))
    }

    async fn enter_grace(&self, sub: &Subscription, period_end: Timestamp, report: &mut SweepReport) {
        let moved = self
            .move_row(sub, SubscriptionStatus::Grace, period_end, report)
            .await;
        if !moved {
            return;
        }
        report.entered_grace += 1;
        tracing::info!(user_id = %sub.user_id, period_end = %period_end.to_storage_string(), "Grace period started");

        let mut updated = sub.clone();
        updated.status = SubscriptionStatus::Grace;
        updated.period_end = period_end;
        self.notify(sub.user_id, &presenter::grace_started_text(&updated)).await;
    }

    async fn remind_last_day(&self, sub: &Subscription, report: &mut SweepReport) {
        let first_time = self.reminded.lock().await.insert((sub.user_id, sub.period_end));
        if !first_time {
            return;
        }
        report.reminded += 1;
        self.notify(sub.user_id, &presenter::last_day_text(sub)).await;
    }

    async fn expire(&self, sub: &Subscription, report: &mut SweepReport) {
        let moved = self
            .move_row(sub, SubscriptionStatus::Expired, sub.period_end, report)
            .await;
        if !moved {
            return;
        }
        if self.renewed_since_expiry(sub).await {
            tracing::info!(user_id = %sub.user_id, "Renewed right after expiry, keeping member");
            report.conflicts += 1;
            return;
        }
        report.expired += 1;
        tracing::info!(user_id = %sub.user_id, "Subscription expired");

        if let Err(err) = self.platform.revoke_membership(self.group, sub.user_id).await {
            tracing::error!(user_id = %sub.user_id, error = %err, "Failed to remove expired member");
            report.revoke_failures.push(sub.user_id);
            let text = presenter::admin_revoke_failed(sub, &err.to_string());
            if let Err(err) = self.platform.send_message(self.admin_chat, &text, None).await {
                tracing::warn!(error = %err, "Failed to report removal failure to admin");
            }
        }

        self.notify(sub.user_id, presenter::access_closed_text()).await;
    }

    /// An approval can land between the move to `expired` and the kick. Only
    /// a row still expired with the same end may be removed from the group.
    async fn renewed_since_expiry(&self, sub: &Subscription) -> bool {
        match self.store.get(sub.user_id).await {
            Ok(Some(current)) => {
                current.status != SubscriptionStatus::Expired || current.period_end != sub.period_end
            }
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(user_id = %sub.user_id, error = %err, "Could not re-read expired row, removing anyway");
                false
            }
        }
    }

    /// Compare-and-set `sub` to `(status, period_end)`. Returns whether the
    /// row moved.
    async fn move_row(
        &self,
        sub: &Subscription,
        status: SubscriptionStatus,
        period_end: Timestamp,
        report: &mut SweepReport,
    ) -> bool {
        if let Err(err) = sub.status.transition_to(status) {
            tracing::error!(user_id = %sub.user_id, error = %err, "Refusing sweep move");
            report.store_failures.push(sub.user_id);
            return false;
        }

        match self
            .store
            .transition(sub.user_id, sub.status, sub.period_end, status, period_end)
            .await
        {
            Ok(true) => true,
            Ok(false) => {
                tracing::info!(user_id = %sub.user_id, target = %status, "Row changed during sweep, skipping");
                report.conflicts += 1;
                false
            }
            Err(err) => {
                tracing::error!(user_id = %sub.user_id, target = %status, error = %err, "Failed to update subscription");
                report.store_failures.push(sub.user_id);
                false
            }
        }
    }

    async fn notify(&self, user: UserId, text: &str) {
        if let Err(err) = self.platform.send_message(user.chat(), text, None).await {
            tracing::warn!(user_id = %user, error = %err, "Failed to notify user");
        }
    }

    async fn forget_old_reminders(&self, now: Timestamp) {
        self.reminded.lock().await.retain(|(_, end)| *end > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::adapters::recording::{PlatformOp, RecordingPlatform};
    use crate::domain::subscription::Tier;
    use chrono::{Duration, TimeZone, Utc};

    const GROUP: i64 = -100_200;
    const ADMIN: i64 = 1;

    fn t0() -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
    }

    fn uid(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    struct Fixture {
        store: Arc<InMemorySubscriptionStore>,
        platform: Arc<RecordingPlatform>,
        engine: LifecycleEngine,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let platform = Arc::new(RecordingPlatform::new());
        let engine = LifecycleEngine::new(
            store.clone(),
            platform.clone(),
            ChatId::new(GROUP),
            ChatId::new(ADMIN),
            LifecyclePolicy::default(),
        );
        Fixture { store, platform, engine }
    }

    fn completed(outcome: SweepOutcome) -> SweepReport {
        match outcome {
            SweepOutcome::Completed(report) => report,
            SweepOutcome::Skipped => panic!("sweep was skipped"),
        }
    }

    #[tokio::test]
    async fn active_past_end_enters_grace_once() {
        let f = fixture();
        f.store.upsert(uid(5), None, Tier::FourteenDays, Duration::days(14), t0()).await.unwrap();
        let now = t0().add_days(14).add_hours(1);

        let first = completed(f.engine.sweep(now).await.unwrap());
        let after_first = f.store.get(uid(5)).await.unwrap().unwrap();
        let second = completed(f.engine.sweep(now).await.unwrap());
        let after_second = f.store.get(uid(5)).await.unwrap().unwrap();

        assert_eq!(first.entered_grace, 1);
        assert_eq!(second.entered_grace, 0);
        assert_eq!(after_first.status, SubscriptionStatus::Grace);
        assert_eq!(after_first.period_end, t0().add_days(16).add_hours(1));
        assert_eq!(after_second.period_end, after_first.period_end);
        assert_eq!(f.platform.messages_to(ChatId::new(5)).len(), 1);
    }

    #[tokio::test]
    async fn grace_past_end_expires_and_kicks_exactly_once() {
        let f = fixture();
        f.store.upsert(uid(5), None, Tier::FourteenDays, Duration::days(14), t0()).await.unwrap();
        f.engine.sweep(t0().add_days(14).add_hours(1)).await.unwrap();

        let later = t0().add_days(16).add_hours(2);
        let report = completed(f.engine.sweep(later).await.unwrap());
        f.engine.sweep(later).await.unwrap();
        f.engine.sweep(later.add_days(1)).await.unwrap();

        assert_eq!(report.expired, 1);
        assert_eq!(f.platform.revocations(), vec![uid(5)]);
        assert_eq!(
            f.store.get(uid(5)).await.unwrap().unwrap().status,
            SubscriptionStatus::Expired
        );
    }

    #[tokio::test]
    async fn last_day_reminder_is_sent_once_per_grace_period() {
        let f = fixture();
        f.store.upsert(uid(5), None, Tier::FourteenDays, Duration::days(14), t0()).await.unwrap();
        let grace_start = t0().add_days(14);
        f.engine.sweep(grace_start).await.unwrap();

        let last_day = grace_start.add_days(1).add_hours(2);
        let first = completed(f.engine.sweep(last_day).await.unwrap());
        let second = completed(f.engine.sweep(last_day.add_hours(3)).await.unwrap());

        assert_eq!(first.reminded, 1);
        assert_eq!(second.reminded, 0);
        // grace notice + one reminder
        assert_eq!(f.platform.messages_to(ChatId::new(5)).len(), 2);
    }

    #[tokio::test]
    async fn grace_with_more_than_a_day_left_is_idle() {
        let f = fixture();
        f.store.upsert(uid(5), None, Tier::FourteenDays, Duration::days(14), t0()).await.unwrap();
        f.engine.sweep(t0().add_days(14)).await.unwrap();

        let report = completed(f.engine.sweep(t0().add_days(14).add_hours(12)).await.unwrap());

        assert_eq!(report.reminded, 0);
        assert_eq!(report.expired, 0);
    }

    #[tokio::test]
    async fn revoke_failure_does_not_abort_the_batch() {
        let f = fixture();
        for id in [5, 6] {
            f.store.upsert(uid(id), None, Tier::FourteenDays, Duration::days(14), t0()).await.unwrap();
        }
        f.engine.sweep(t0().add_days(14)).await.unwrap();
        f.platform.fail_on(PlatformOp::RevokeMembership);

        let report = completed(f.engine.sweep(t0().add_days(17)).await.unwrap());

        assert_eq!(report.expired, 2);
        assert_eq!(report.revoke_failures.len(), 2);
        assert_eq!(f.platform.messages_to(ChatId::new(ADMIN)).len(), 2);
        assert_eq!(f.store.count(Some(SubscriptionStatus::Expired)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn blocked_user_does_not_abort_the_batch() {
        let f = fixture();
        for id in [5, 6] {
            f.store.upsert(uid(id), None, Tier::FourteenDays, Duration::days(14), t0()).await.unwrap();
        }
        f.platform.fail_chat(ChatId::new(5));

        let report = completed(f.engine.sweep(t0().add_days(14)).await.unwrap());

        assert_eq!(report.entered_grace, 2);
    }

    #[tokio::test]
    async fn expired_and_active_rows_in_period_are_left_alone() {
        let f = fixture();
        f.store.upsert(uid(5), None, Tier::OneMonth, Duration::days(30), t0()).await.unwrap();
        f.store.upsert(uid(6), None, Tier::FourteenDays, Duration::days(14), t0()).await.unwrap();
        f.store.set_status(uid(6), SubscriptionStatus::Expired, None).await.unwrap();

        let report = completed(f.engine.sweep(t0().add_days(20)).await.unwrap());

        assert_eq!(report.scanned, 1);
        assert_eq!(report, SweepReport { scanned: 1, ..SweepReport::default() });
        assert!(f.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn overlapping_sweep_is_skipped() {
        let f = fixture();
        let _held = f.engine.running.lock().await;

        assert_eq!(f.engine.sweep(t0()).await.unwrap(), SweepOutcome::Skipped);
    }

    #[tokio::test]
    async fn store_failure_is_reported_per_user() {
        let f = fixture();
        f.store.upsert(uid(5), None, Tier::FourteenDays, Duration::days(14), t0()).await.unwrap();
        f.store.fail_writes(true);

        let report = completed(f.engine.sweep(t0().add_days(15)).await.unwrap());

        assert_eq!(report.store_failures, vec![uid(5)]);
        assert!(f.platform.calls().is_empty());
    }

    /// Store that lets an approval renew the user right after the sweep
    /// marks the row expired.
    struct RenewAfterExpiry {
        inner: Arc<InMemorySubscriptionStore>,
        renew_at: Timestamp,
    }

    #[async_trait::async_trait]
    impl SubscriptionStore for RenewAfterExpiry {
        async fn upsert(
            &self,
            user_id: UserId,
            display_name: Option<String>,
            tier: Tier,
            extend_by: Duration,
            now: Timestamp,
        ) -> Result<Subscription, DomainError> {
            self.inner.upsert(user_id, display_name, tier, extend_by, now).await
        }

        async fn get(&self, user_id: UserId) -> Result<Option<Subscription>, DomainError> {
            self.inner.get(user_id).await
        }

        async fn list_by_status(
            &self,
            statuses: &[SubscriptionStatus],
        ) -> Result<Vec<Subscription>, DomainError> {
            self.inner.list_by_status(statuses).await
        }

        async fn set_status(
            &self,
            user_id: UserId,
            status: SubscriptionStatus,
            period_end: Option<Timestamp>,
        ) -> Result<bool, DomainError> {
            self.inner.set_status(user_id, status, period_end).await
        }

        async fn transition(
            &self,
            user_id: UserId,
            expected_status: SubscriptionStatus,
            expected_end: Timestamp,
            new_status: SubscriptionStatus,
            new_end: Timestamp,
        ) -> Result<bool, DomainError> {
            let moved = self
                .inner
                .transition(user_id, expected_status, expected_end, new_status, new_end)
                .await?;
            if moved && new_status == SubscriptionStatus::Expired {
                self.inner
                    .upsert(user_id, None, Tier::OneMonth, Duration::days(30), self.renew_at)
                    .await?;
            }
            Ok(moved)
        }

        async fn delete(&self, user_id: UserId) -> Result<bool, DomainError> {
            self.inner.delete(user_id).await
        }

        async fn purge(&self, status: SubscriptionStatus) -> Result<u64, DomainError> {
            self.inner.purge(status).await
        }

        async fn count(&self, status: Option<SubscriptionStatus>) -> Result<u64, DomainError> {
            self.inner.count(status).await
        }

        async fn export(&self) -> Result<Vec<Subscription>, DomainError> {
            self.inner.export().await
        }
    }

    #[tokio::test]
    async fn renewal_right_after_expiry_keeps_the_member() {
        let inner = Arc::new(InMemorySubscriptionStore::new());
        let platform = Arc::new(RecordingPlatform::new());
        inner.upsert(uid(5), None, Tier::FourteenDays, Duration::days(14), t0()).await.unwrap();
        inner
            .set_status(uid(5), SubscriptionStatus::Grace, Some(t0().add_days(16)))
            .await
            .unwrap();
        let now = t0().add_days(17);
        let engine = LifecycleEngine::new(
            Arc::new(RenewAfterExpiry { inner: inner.clone(), renew_at: now }),
            platform.clone(),
            ChatId::new(GROUP),
            ChatId::new(ADMIN),
            LifecyclePolicy::default(),
        );

        let report = completed(engine.sweep(now).await.unwrap());

        assert_eq!(report.expired, 0);
        assert_eq!(report.conflicts, 1);
        assert!(platform.revocations().is_empty());
        assert!(platform.messages_to(uid(5).chat()).is_empty());
        let stored = inner.get(uid(5)).await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Active);
        assert_eq!(stored.period_end, now.add_days(30));
    }
}
