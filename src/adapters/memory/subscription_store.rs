//! In-memory subscription store for tests and local runs.
//!
//! Same semantics as the SQLite store. Every operation takes one lock over
//! the whole map, so per-user atomicity holds trivially.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::subscription::{Subscription, SubscriptionStatus, Tier};
use crate::ports::SubscriptionStore;

/// In-memory implementation of the SubscriptionStore port.
///
/// # Example
///
/// ```ignore
/// let store = InMemorySubscriptionStore::new();
/// store.insert(subscription).await;
///
/// store.fail_reads(true);
/// assert!(store.get(user).await.is_err());
///
/// store.fail_writes(true);
/// assert!(store.upsert(user, None, tier, tier.duration(), now).await.is_err());
/// ```
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    rows: Mutex<HashMap<UserId, Subscription>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Put a row in place as-is.
    pub async fn insert(&self, subscription: Subscription) {
        self.rows.lock().await.insert(subscription.user_id, subscription);
    }

    /// Make every subsequent write fail with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent read fail with a database error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_readable(&self) -> Result<(), DomainError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DomainError::database("store is unavailable"));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::database("store is unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn upsert(
        &self,
        user_id: UserId,
        display_name: Option<String>,
        tier: Tier,
        extend_by: Duration,
        now: Timestamp,
    ) -> Result<Subscription, DomainError> {
        self.check_writable()?;
        let mut rows = self.rows.lock().await;

        let sub = match rows.get_mut(&user_id) {
            Some(existing) => {
                existing.renew(display_name, tier, extend_by, now);
                existing.clone()
            }
            None => {
                let sub = Subscription::activate(user_id, display_name, tier, extend_by, now);
                rows.insert(user_id, sub.clone());
                sub
            }
        };
        Ok(sub)
    }

    async fn get(&self, user_id: UserId) -> Result<Option<Subscription>, DomainError> {
        self.check_readable()?;
        Ok(self.rows.lock().await.get(&user_id).cloned())
    }

    async fn list_by_status(
        &self,
        statuses: &[SubscriptionStatus],
    ) -> Result<Vec<Subscription>, DomainError> {
        self.check_readable()?;
        let rows = self.rows.lock().await;
        let mut matching: Vec<Subscription> = rows
            .values()
            .filter(|s| statuses.contains(&s.status))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.period_end.cmp(&a.period_end));
        Ok(matching)
    }

    async fn set_status(
        &self,
        user_id: UserId,
        status: SubscriptionStatus,
        period_end: Option<Timestamp>,
    ) -> Result<bool, DomainError> {
        self.check_writable()?;
        let mut rows = self.rows.lock().await;
        match rows.get_mut(&user_id) {
            Some(sub) => {
                sub.status = status;
                if let Some(end) = period_end {
                    sub.period_end = end;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn transition(
        &self,
        user_id: UserId,
        expected_status: SubscriptionStatus,
        expected_end: Timestamp,
        new_status: SubscriptionStatus,
        new_end: Timestamp,
    ) -> Result<bool, DomainError> {
        self.check_writable()?;
        let mut rows = self.rows.lock().await;
        match rows.get_mut(&user_id) {
            Some(sub) if sub.status == expected_status && sub.period_end == expected_end => {
                sub.status = new_status;
                sub.period_end = new_end;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, user_id: UserId) -> Result<bool, DomainError> {
        self.check_writable()?;
        Ok(self.rows.lock().await.remove(&user_id).is_some())
    }

    async fn purge(&self, status: SubscriptionStatus) -> Result<u64, DomainError> {
        self.check_writable()?;
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|_, s| s.status != status);
        Ok((before - rows.len()) as u64)
    }

    async fn count(&self, status: Option<SubscriptionStatus>) -> Result<u64, DomainError> {
        self.check_readable()?;
        let rows = self.rows.lock().await;
        let count = match status {
            Some(status) => rows.values().filter(|s| s.status == status).count(),
            None => rows.len(),
        };
        Ok(count as u64)
    }

    async fn export(&self) -> Result<Vec<Subscription>, DomainError> {
        self.check_readable()?;
        let mut all: Vec<Subscription> = self.rows.lock().await.values().cloned().collect();
        all.sort_by_key(|s| s.user_id);
        Ok(all)
    }
}
