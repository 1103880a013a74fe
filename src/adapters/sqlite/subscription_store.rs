//! SQLite implementation of SubscriptionStore.
//!
//! Provides persistent storage for subscriptions in the `users` table.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::subscription::{Subscription, SubscriptionStatus, Tier};
use crate::ports::SubscriptionStore;

const SELECT_COLUMNS: &str =
    "SELECT user_id, username, tariff, start_date, end_date, status, created_at FROM users";

/// Locks are dropped from the map once this many accumulate unused.
const LOCK_PRUNE_THRESHOLD: usize = 1024;

/// SQLite implementation of the SubscriptionStore port.
///
/// Writes for one user are serialized through a per-user async lock, so a
/// renewal and a sweep transition never interleave for the same row.
pub struct SqliteSubscriptionStore {
    pool: SqlitePool,
    locks: UserLocks,
}

impl SqliteSubscriptionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: UserLocks::default(),
        }
    }

    async fn fetch(&self, user_id: UserId) -> Result<Option<Subscription>, DomainError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("{} WHERE user_id = ?", SELECT_COLUMNS))
                .bind(user_id.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("find subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }
}

/// Keyed async locks, one per user.
#[derive(Default)]
struct UserLocks {
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() >= LOCK_PRUNE_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Database row of the `users` table.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    user_id: i64,
    username: Option<String>,
    tariff: String,
    start_date: String,
    end_date: String,
    status: String,
    created_at: String,
}

impl TryFrom<UserRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, e: &dyn std::fmt::Display| {
            DomainError::database(format!("Invalid {} for user {}: {}", field, row.user_id, e))
                .with_detail("column", field)
        };

        Ok(Subscription {
            user_id: UserId::new(row.user_id).map_err(|e| corrupt("user_id", &e))?,
            display_name: row.username.clone(),
            tier: row.tariff.parse::<Tier>().map_err(|e| corrupt("tariff", &e))?,
            period_start: Timestamp::parse(&row.start_date).map_err(|e| corrupt("start_date", &e))?,
            period_end: Timestamp::parse(&row.end_date).map_err(|e| corrupt("end_date", &e))?,
            status: row
                .status
                .parse::<SubscriptionStatus>()
                .map_err(|e| corrupt("status", &e))?,
            created_at: Timestamp::parse(&row.created_at).map_err(|e| corrupt("created_at", &e))?,
        })
    }
}

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, e))
        .with_detail("action", action)
}

/// Read-modify-write of one row inside an open write transaction.
async fn upsert_row(
    conn: &mut SqliteConnection,
    user_id: UserId,
    display_name: Option<String>,
    tier: Tier,
    extend_by: Duration,
    now: Timestamp,
) -> Result<Subscription, DomainError> {
    let existing: Option<UserRow> = sqlx::query_as(&format!("{} WHERE user_id = ?", SELECT_COLUMNS))
        .bind(user_id.get())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| db_error("read subscription", e))?;

    let subscription = match existing {
        Some(row) => {
            let mut sub = Subscription::try_from(row)?;
            sub.renew(display_name, tier, extend_by, now);
            sub
        }
        None => Subscription::activate(user_id, display_name, tier, extend_by, now),
    };

    sqlx::query(
        r#"
        INSERT INTO users (user_id, username, tariff, start_date, end_date, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            username = excluded.username,
            tariff = excluded.tariff,
            start_date = excluded.start_date,
            end_date = excluded.end_date,
            status = excluded.status
        "#,
    )
    .bind(subscription.user_id.get())
    .bind(&subscription.display_name)
    .bind(subscription.tier.id())
    .bind(subscription.period_start.to_storage_string())
    .bind(subscription.period_end.to_storage_string())
    .bind(subscription.status.as_str())
    .bind(subscription.created_at.to_storage_string())
    .execute(&mut *conn)
    .await
    .map_err(|e| db_error("save subscription", e))?;

    Ok(subscription)
}

#[async_trait]
impl SubscriptionStore for SqliteSubscriptionStore {
    async fn upsert(
        &self,
        user_id: UserId,
        display_name: Option<String>,
        tier: Tier,
        extend_by: Duration,
        now: Timestamp,
    ) -> Result<Subscription, DomainError> {
        let _guard = self.locks.acquire(user_id).await;

        // A deferred transaction would read under a snapshot and then fail to
        // upgrade once another connection has written. Take the write lock
        // first so `busy_timeout` covers the wait.
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("acquire connection", e))?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(|e| db_error("begin upsert", e))?;

        let result = match upsert_row(&mut *conn, user_id, display_name, tier, extend_by, now).await {
            Ok(subscription) => sqlx::query("COMMIT")
                .execute(&mut *conn)
                .await
                .map(|_| subscription)
                .map_err(|e| db_error("commit upsert", e)),
            Err(err) => Err(err),
        };

        if result.is_err() {
            if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                tracing::warn!(user_id = %user_id, error = %e, "Rollback after failed upsert failed");
            }
        }
        result
    }

    async fn get(&self, user_id: UserId) -> Result<Option<Subscription>, DomainError> {
        self.fetch(user_id).await
    }

    async fn list_by_status(
        &self,
        statuses: &[SubscriptionStatus],
    ) -> Result<Vec<Subscription>, DomainError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
        query.push(" WHERE status IN (");
        let mut separated = query.separated(", ");
        for status in statuses {
            separated.push_bind(status.as_str());
        }
        separated.push_unseparated(") ORDER BY end_date DESC");

        let rows: Vec<UserRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list subscriptions", e))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn set_status(
        &self,
        user_id: UserId,
        status: SubscriptionStatus,
        period_end: Option<Timestamp>,
    ) -> Result<bool, DomainError> {
        let _guard = self.locks.acquire(user_id).await;

        let result = sqlx::query(
            "UPDATE users SET status = ?, end_date = COALESCE(?, end_date) WHERE user_id = ?",
        )
        .bind(status.as_str())
        .bind(period_end.map(|t| t.to_storage_string()))
        .bind(user_id.get())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update status", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn transition(
        &self,
        user_id: UserId,
        expected_status: SubscriptionStatus,
        expected_end: Timestamp,
        new_status: SubscriptionStatus,
        new_end: Timestamp,
    ) -> Result<bool, DomainError> {
        let _guard = self.locks.acquire(user_id).await;

        let result = sqlx::query(
            r#"
            UPDATE users SET status = ?, end_date = ?
            WHERE user_id = ? AND status = ? AND end_date = ?
            "#,
        )
        .bind(new_status.as_str())
        .bind(new_end.to_storage_string())
        .bind(user_id.get())
        .bind(expected_status.as_str())
        .bind(expected_end.to_storage_string())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("transition subscription", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, user_id: UserId) -> Result<bool, DomainError> {
        let _guard = self.locks.acquire(user_id).await;

        let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete subscription", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge(&self, status: SubscriptionStatus) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE status = ?")
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("purge subscriptions", e))?;

        Ok(result.rows_affected())
    }

    async fn count(&self, status: Option<SubscriptionStatus>) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE ?1 IS NULL OR status = ?1")
            .bind(status.map(|s| s.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("count subscriptions", e))?;

        Ok(count.max(0) as u64)
    }

    async fn export(&self) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!("{} ORDER BY user_id", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("export subscriptions", e))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }
}
