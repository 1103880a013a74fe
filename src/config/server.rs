//! Listener and runtime environment.

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};

use super::error::ValidationError;

/// Where the webhook listener binds, and how the process logs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Must be non-zero. The webhook URL registered with the platform has to
    /// reach this port through the reverse proxy.
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub environment: Environment,

    /// `EnvFilter` directive, e.g. `info,club_gate=debug`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Deployment environment. Production switches logs to JSON and requires an
/// HTTPS webhook.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ValidationError::InvalidListenAddress(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        self.socket_addr().map(|_| ())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info,club_gate=debug,sqlx=warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_all_interfaces() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(config.environment, Environment::Development);
        assert!(config.log_level.contains("club_gate=debug"));
    }

    #[test]
    fn ipv6_host_is_accepted() {
        let config = ServerConfig {
            host: "::1".to_string(),
            port: 3000,
            ..Default::default()
        };
        assert_eq!(config.socket_addr().unwrap().to_string(), "[::1]:3000");
    }

    #[test]
    fn hostname_is_rejected() {
        let config = ServerConfig {
            host: "bot.example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidListenAddress("bot.example.com".to_string()))
        );
    }

    #[test]
    fn zero_port_is_rejected() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPort));
    }

    #[test]
    fn production_flag() {
        let mut config = ServerConfig::default();
        assert!(!config.is_production());
        config.environment = Environment::Production;
        assert!(config.is_production());
    }
}
