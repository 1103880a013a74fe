//! Subscription store port.
//!
//! Durable table of one record per user. Every other component depends on
//! it.
//!
//! # Design
//!
//! - **Upsert, never append**: `upsert` creates or renews the single row
//! - **Atomic per user**: concurrent upserts for one user never lose an update
//! - **Compare-and-set transitions**: the sweep only moves a row that still
//!   looks the way it did when the sweep read it

use async_trait::async_trait;
use chrono::Duration;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::subscription::{Subscription, SubscriptionStatus, Tier};

/// Repository port for subscriptions.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Create or renew the subscription for `user_id`.
    ///
    /// A new row starts at `now` and runs for `extend_by`. An existing row
    /// follows [`Subscription::renew`]. Returns the stored result.
    async fn upsert(
        &self,
        user_id: UserId,
        display_name: Option<String>,
        tier: Tier,
        extend_by: Duration,
        now: Timestamp,
    ) -> Result<Subscription, DomainError>;

    /// Find the subscription of a user.
    async fn get(&self, user_id: UserId) -> Result<Option<Subscription>, DomainError>;

    /// All rows whose status is in `statuses`, newest `period_end` first.
    async fn list_by_status(
        &self,
        statuses: &[SubscriptionStatus],
    ) -> Result<Vec<Subscription>, DomainError>;

    /// Unconditionally set the status, and the period end when given.
    ///
    /// Returns `false` when no row exists.
    async fn set_status(
        &self,
        user_id: UserId,
        status: SubscriptionStatus,
        period_end: Option<Timestamp>,
    ) -> Result<bool, DomainError>;

    /// Move a row from `(expected_status, expected_end)` to
    /// `(new_status, new_end)`.
    ///
    /// Returns `false`, changing nothing, when the row is gone or no longer
    /// matches the expectation.
    async fn transition(
        &self,
        user_id: UserId,
        expected_status: SubscriptionStatus,
        expected_end: Timestamp,
        new_status: SubscriptionStatus,
        new_end: Timestamp,
    ) -> Result<bool, DomainError>;

    /// Remove one row. Returns `false` when there was none.
    async fn delete(&self, user_id: UserId) -> Result<bool, DomainError>;

    /// Remove every row with `status`. Returns the number removed.
    async fn purge(&self, status: SubscriptionStatus) -> Result<u64, DomainError>;

    /// Count rows, optionally restricted to one status.
    async fn count(&self, status: Option<SubscriptionStatus>) -> Result<u64, DomainError>;

    /// Every row, for backups.
    async fn export(&self) -> Result<Vec<Subscription>, DomainError>;
}
