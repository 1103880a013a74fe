//! GetSubscriptionStatsHandler - Query handler for the admin counters.

use std::sync::Arc;

use crate::domain::subscription::{SubscriptionError, SubscriptionStatus};
use crate::ports::SubscriptionStore;

/// Row counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub active: u64,
    pub grace: u64,
    pub expired: u64,
    pub total: u64,
}

pub struct GetSubscriptionStatsHandler {
    store: Arc<dyn SubscriptionStore>,
}

impl GetSubscriptionStatsHandler {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self) -> Result<StatusCounts, SubscriptionError> {
        Ok(StatusCounts {
            active: self.store.count(Some(SubscriptionStatus::Active)).await?,
            grace: self.store.count(Some(SubscriptionStatus::Grace)).await?,
            expired: self.store.count(Some(SubscriptionStatus::Expired)).await?,
            total: self.store.count(None).await?,
        })
    }
}
