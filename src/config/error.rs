//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid listen address '{0}'")]
    InvalidListenAddress(String),

    #[error("Invalid database URL format (expected sqlite:...)")]
    InvalidDatabaseUrl,

    #[error("Pool size must be between 1 and {0}")]
    InvalidPoolSize(u32),

    #[error("Administrator id must be a positive user id")]
    InvalidAdminId,

    #[error("Group id must be a negative chat id")]
    InvalidGroupId,

    #[error("Invalid API base URL")]
    InvalidApiBaseUrl,

    #[error("Webhook base URL must use HTTPS in production")]
    WebhookMustBeHttps,

    #[error("Webhook path must start with '/'")]
    InvalidWebhookPath,

    #[error("Webhook secret must be 1-256 characters of A-Z, a-z, 0-9, '_' or '-'")]
    InvalidWebhookSecret,

    #[error("Invalid time of day '{0}' (expected HH:MM)")]
    InvalidTimeOfDay(String),

    #[error("Pending proof TTL must be between 1 and 168 hours")]
    InvalidProofTtl,
}
