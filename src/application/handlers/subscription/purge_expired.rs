//! PurgeExpiredHandler - Command handler for dropping expired rows.

use std::sync::Arc;

use crate::domain::subscription::{SubscriptionError, SubscriptionStatus};
use crate::ports::SubscriptionStore;

pub struct PurgeExpiredHandler {
    store: Arc<dyn SubscriptionStore>,
}

impl PurgeExpiredHandler {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    /// Returns the number of rows removed.
    pub async fn handle(&self) -> Result<u64, SubscriptionError> {
        let removed = self.store.purge(SubscriptionStatus::Expired).await?;
        tracing::info!(removed, "Expired subscriptions purged");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::domain::subscription::Tier;

    #[tokio::test]
    async fn removes_only_expired_rows() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let now = Timestamp::now();
        for id in [1, 2] {
            let user = UserId::new(id).unwrap();
            store.upsert(user, None, Tier::OneMonth, Tier::OneMonth.duration(), now).await.unwrap();
        }
        store.set_status(UserId::new(2).unwrap(), SubscriptionStatus::Expired, None).await.unwrap();

        let removed = PurgeExpiredHandler::new(store.clone()).handle().await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.count(None).await.unwrap(), 1);
    }
}
