//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `CLUB_GATE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use club_gate::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Webhook registered at {}", config.webhook.url());
//! ```

mod bot;
mod database;
mod error;
mod payment;
mod schedule;
mod server;
mod webhook;

pub use bot::BotConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use schedule::ScheduleConfig;
pub use server::{Environment, ServerConfig};
pub use webhook::WebhookConfig;

use serde::Deserialize;

use crate::application::BotSettings;
use crate::domain::subscription::LifecyclePolicy;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, log filter)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (SQLite file)
    pub database: DatabaseConfig,

    /// Bot token, administrator and managed group
    pub telegram: BotConfig,

    /// Inbound update delivery
    pub webhook: WebhookConfig,

    /// Transfer details shown to users
    pub payment: PaymentConfig,

    /// Daily jobs
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CLUB_GATE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `CLUB_GATE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CLUB_GATE__TELEGRAM__BOT_TOKEN=...` -> `telegram.bot_token = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CLUB_GATE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.telegram.validate()?;
        self.webhook.validate(&self.server.environment)?;
        self.payment.validate()?;
        self.schedule.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Identities and policy the workflows run with.
    pub fn bot_settings(&self) -> Result<BotSettings, ValidationError> {
        Ok(BotSettings {
            admin_id: self.telegram.admin()?,
            group_id: self.telegram.group(),
            payment: self.payment.details(),
            policy: LifecyclePolicy::default(),
        })
    }
}
