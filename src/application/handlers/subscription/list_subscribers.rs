//! ListSubscribersHandler - Query handler for members with access.

use std::sync::Arc;

use crate::domain::subscription::{Subscription, SubscriptionError, SubscriptionStatus};
use crate::ports::SubscriptionStore;

pub struct ListSubscribersHandler {
    store: Arc<dyn SubscriptionStore>,
}

impl ListSubscribersHandler {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    /// Active and grace subscriptions, latest period end first.
    pub async fn handle(&self) -> Result<Vec<Subscription>, SubscriptionError> {
        Ok(self.store.list_by_status(&SubscriptionStatus::LIVE).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::domain::subscription::Tier;
    use chrono::Duration;

    #[tokio::test]
    async fn lists_live_rows_by_end_descending() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let now = Timestamp::now();
        for (id, days) in [(1, 10), (2, 30), (3, 20)] {
            store
                .upsert(UserId::new(id).unwrap(), None, Tier::OneMonth, Duration::days(days), now)
                .await
                .unwrap();
        }
        store.set_status(UserId::new(3).unwrap(), SubscriptionStatus::Expired, None).await.unwrap();

        let ids: Vec<i64> = ListSubscribersHandler::new(store)
            .handle()
            .await
            .unwrap()
            .iter()
            .map(|s| s.user_id.get())
            .collect();

        assert_eq!(ids, vec![2, 1]);
    }
}
