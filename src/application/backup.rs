//! Store backups sent to the administrator as a JSON document.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{ChatId, DomainError, ErrorCode, Timestamp};
use crate::domain::subscription::Subscription;
use crate::ports::{ChatPlatform, SubscriptionStore};

use super::presenter;

/// One `users` row, with the table's column names.
#[derive(Debug, Serialize)]
struct BackupRow<'a> {
    user_id: i64,
    username: Option<&'a str>,
    tariff: &'a str,
    start_date: String,
    end_date: String,
    status: &'a str,
    created_at: String,
}

impl<'a> From<&'a Subscription> for BackupRow<'a> {
    fn from(sub: &'a Subscription) -> Self {
        Self {
            user_id: sub.user_id.get(),
            username: sub.display_name.as_deref(),
            tariff: sub.tier.id(),
            start_date: sub.period_start.to_storage_string(),
            end_date: sub.period_end.to_storage_string(),
            status: sub.status.as_str(),
            created_at: sub.created_at.to_storage_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BackupDocument<'a> {
    generated_at: String,
    count: usize,
    users: Vec<BackupRow<'a>>,
}

/// A rendered backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub file_name: String,
    pub rows: usize,
    pub bytes: Vec<u8>,
}

/// `subscriptions-YYYYMMDD-HHMM.json`
pub fn backup_file_name(at: Timestamp) -> String {
    format!("subscriptions-{}.json", at.as_datetime().format("%Y%m%d-%H%M"))
}

/// Render `subscriptions` as a pretty-printed JSON document.
pub fn render_backup(subscriptions: &[Subscription], at: Timestamp) -> Result<Backup, DomainError> {
    let document = BackupDocument {
        generated_at: at.to_storage_string(),
        count: subscriptions.len(),
        users: subscriptions.iter().map(BackupRow::from).collect(),
    };
    let bytes = serde_json::to_vec_pretty(&document).map_err(|e| {
        DomainError::new(ErrorCode::InternalError, format!("Failed to encode backup: {}", e))
    })?;

    Ok(Backup {
        file_name: backup_file_name(at),
        rows: subscriptions.len(),
        bytes,
    })
}

pub struct BackupExporter {
    store: Arc<dyn SubscriptionStore>,
    platform: Arc<dyn ChatPlatform>,
    admin_chat: ChatId,
}

impl BackupExporter {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        platform: Arc<dyn ChatPlatform>,
        admin_chat: ChatId,
    ) -> Self {
        Self {
            store,
            platform,
            admin_chat,
        }
    }

    /// Export the whole store and send it to the administrator.
    pub async fn send_backup(&self, now: Timestamp) -> Result<usize, DomainError> {
        let subscriptions = self.store.export().await?;
        let backup = render_backup(&subscriptions, now)?;
        let caption = presenter::backup_caption(backup.rows, now);

        self.platform
            .send_document(self.admin_chat, &backup.file_name, backup.bytes, Some(&caption))
            .await?;

        tracing::info!(rows = backup.rows, file = %backup.file_name, "Backup sent");
        Ok(backup.rows)
    }
}
