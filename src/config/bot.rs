//! Telegram bot configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::foundation::{ChatId, UserId};

use super::error::ValidationError;

/// Bot identity and the two chats it serves.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Bot API token
    pub bot_token: SecretString,

    /// Bot API root; overridden in tests and for local API servers
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// The single administrator's user id
    pub admin_id: i64,

    /// The managed group's chat id (negative)
    pub group_id: i64,
}

impl BotConfig {
    pub fn admin(&self) -> Result<UserId, ValidationError> {
        UserId::new(self.admin_id).map_err(|_| ValidationError::InvalidAdminId)
    }

    pub fn group(&self) -> ChatId {
        ChatId::new(self.group_id)
    }

    /// Validate bot configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bot_token.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("TELEGRAM__BOT_TOKEN"));
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidApiBaseUrl);
        }
        self.admin()?;
        if self.group_id >= 0 {
            return Err(ValidationError::InvalidGroupId);
        }
        Ok(())
    }
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}
