//! Webhook configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Longest secret the Bot API accepts.
pub const MAX_SECRET_LEN: usize = 256;

/// Where Telegram delivers updates.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Externally reachable origin, e.g. `https://bot.example.com`
    pub base_url: String,

    /// Route the updates are posted to
    #[serde(default = "default_path")]
    pub path: String,

    /// Shared secret echoed back by Telegram in every delivery
    pub secret: SecretString,
}

impl WebhookConfig {
    /// Full URL registered with Telegram.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path)
    }

    /// Validate webhook configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("WEBHOOK__BASE_URL"));
        }
        if *environment == Environment::Production && !self.base_url.starts_with("https://") {
            return Err(ValidationError::WebhookMustBeHttps);
        }
        if !self.path.starts_with('/') {
            return Err(ValidationError::InvalidWebhookPath);
        }

        let secret = self.secret.expose_secret();
        let allowed = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';
        if secret.is_empty() || secret.len() > MAX_SECRET_LEN || !secret.chars().all(allowed) {
            return Err(ValidationError::InvalidWebhookSecret);
        }
        Ok(())
    }
}

fn default_path() -> String {
    "/webhook".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> WebhookConfig {
        WebhookConfig {
            base_url: "https://bot.example.com/".to_string(),
            path: default_path(),
            secret: SecretString::new("s3cret_token-1".to_string()),
        }
    }

    #[test]
    fn test_url_joins_base_and_path() {
        assert_eq!(valid().url(), "https://bot.example.com/webhook");
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate(&Environment::Production).is_ok());
    }

    #[test]
    fn test_http_only_allowed_outside_production() {
        let config = WebhookConfig {
            base_url: "http://localhost:8080".to_string(),
            ..valid()
        };
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::WebhookMustBeHttps)
        );
    }

    #[test]
    fn test_path_needs_leading_slash() {
        let config = WebhookConfig {
            path: "webhook".to_string(),
            ..valid()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::InvalidWebhookPath)
        );
    }

    #[test]
    fn test_secret_charset_and_length() {
        for bad in ["", "has space", "semi;colon", &"x".repeat(MAX_SECRET_LEN + 1)] {
            let config = WebhookConfig {
                secret: SecretString::new(bad.to_string()),
                ..valid()
            };
            assert_eq!(
                config.validate(&Environment::Development),
                Err(ValidationError::InvalidWebhookSecret),
                "secret {:?} should be rejected",
                bad
            );
        }
    }
}
