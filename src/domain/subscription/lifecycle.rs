//! Lifecycle rules evaluated by the sweep.
//!
//! Pure decision logic: given a stored subscription and the current time,
//! decide what the sweep must do. Persisting the decision and talking to
//! the platform is the engine's job.

use chrono::Duration;

use crate::domain::foundation::Timestamp;

use super::{Subscription, SubscriptionStatus};

/// Timing policy for the access lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// Extra access after the nominal period ends.
    pub grace: Duration,

    /// Remaining grace at or below which the last-day reminder goes out.
    pub reminder_window: Duration,

    /// Validity of a single-use invite link.
    pub invite_validity: Duration,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            grace: Duration::days(2),
            reminder_window: Duration::days(1),
            invite_validity: Duration::hours(24),
        }
    }
}

/// What a sweep should do with one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    /// `active` and past `period_end`: move to grace with a new end.
    EnterGrace { period_end: Timestamp },

    /// In grace with at most one day left.
    RemindLastDay,

    /// Grace has run out: close access.
    Expire,

    /// Nothing to do this sweep.
    Idle,
}

impl LifecyclePolicy {
    /// Decide the transition for `sub` at `now`.
    ///
    /// Grace runs for the full grace duration from the moment it is
    /// entered, which equals `period_end + grace` when the sweep is on time.
    pub fn evaluate(&self, sub: &Subscription, now: Timestamp) -> LifecycleAction {
        match sub.status {
            SubscriptionStatus::Active if now >= sub.period_end => LifecycleAction::EnterGrace {
                period_end: now.plus(self.grace),
            },
            SubscriptionStatus::Grace if now >= sub.period_end => LifecycleAction::Expire,
            SubscriptionStatus::Grace if sub.remaining(now) <= self.reminder_window => {
                LifecycleAction::RemindLastDay
            }
            _ => LifecycleAction::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::domain::subscription::Tier;
    use chrono::{TimeZone, Utc};

    fn t0() -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
    }

    fn sub(status: SubscriptionStatus, end: Timestamp) -> Subscription {
        Subscription {
            user_id: UserId::new(1).unwrap(),
            display_name: None,
            tier: Tier::FourteenDays,
            period_start: t0(),
            period_end: end,
            status,
            created_at: t0(),
        }
    }

    #[test]
    fn active_before_end_is_idle() {
        let policy = LifecyclePolicy::default();
        let s = sub(SubscriptionStatus::Active, t0().add_days(14));
        assert_eq!(policy.evaluate(&s, t0().add_days(13)), LifecycleAction::Idle);
    }

    #[test]
    fn active_at_end_enters_grace_for_two_days() {
        let policy = LifecyclePolicy::default();
        let end = t0().add_days(14);
        let s = sub(SubscriptionStatus::Active, end);
        assert_eq!(
            policy.evaluate(&s, end),
            LifecycleAction::EnterGrace { period_end: end.add_days(2) }
        );
    }

    #[test]
    fn late_sweep_still_grants_full_grace() {
        let policy = LifecyclePolicy::default();
        let s = sub(SubscriptionStatus::Active, t0().add_days(14));
        let now = t0().add_days(14).add_hours(1);
        assert_eq!(
            policy.evaluate(&s, now),
            LifecycleAction::EnterGrace { period_end: t0().add_days(16).add_hours(1) }
        );
    }

    #[test]
    fn grace_with_more_than_a_day_left_is_idle() {
        let policy = LifecyclePolicy::default();
        let s = sub(SubscriptionStatus::Grace, t0().add_days(2));
        assert_eq!(policy.evaluate(&s, t0().add_hours(1)), LifecycleAction::Idle);
    }

    #[test]
    fn grace_with_one_day_left_reminds() {
        let policy = LifecyclePolicy::default();
        let s = sub(SubscriptionStatus::Grace, t0().add_days(2));
        assert_eq!(policy.evaluate(&s, t0().add_days(1)), LifecycleAction::RemindLastDay);
    }

    #[test]
    fn grace_past_end_expires() {
        let policy = LifecyclePolicy::default();
        let s = sub(SubscriptionStatus::Grace, t0().add_days(2));
        assert_eq!(policy.evaluate(&s, t0().add_days(2)), LifecycleAction::Expire);
    }

    #[test]
    fn grace_is_never_re_extended() {
        let policy = LifecyclePolicy::default();
        let s = sub(SubscriptionStatus::Grace, t0().add_days(2));
        for hours in 0..72 {
            let action = policy.evaluate(&s, t0().add_hours(hours));
            assert!(!matches!(action, LifecycleAction::EnterGrace { .. }));
        }
    }

    #[test]
    fn expired_and_pending_are_idle() {
        let policy = LifecyclePolicy::default();
        let past = t0().add_days(-10);
        assert_eq!(
            policy.evaluate(&sub(SubscriptionStatus::Expired, past), t0()),
            LifecycleAction::Idle
        );
        assert_eq!(
            policy.evaluate(&sub(SubscriptionStatus::Pending, past), t0()),
            LifecycleAction::Idle
        );
    }
}
