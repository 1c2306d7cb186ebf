//! Configuration management for the smallchat server
//!
//! Settings come from an optional `config.toml` in the working directory,
//! overridden by `SMALLCHAT_*` environment variables.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CLIENTS: usize = 256;
const DEFAULT_MAX_LINE_LENGTH: usize = 256;

/// Server configuration, loaded once at startup
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address the chat listener binds to
    pub bind_address: String,

    /// Port the chat listener binds to
    pub port: u16,

    /// Maximum number of simultaneously registered clients
    /// Environment: SMALLCHAT_MAX_CLIENTS
    pub max_clients: usize,

    /// Longest accepted input line in bytes, line ending included
    pub max_line_length: usize,

    /// Per-recipient write deadline in milliseconds, 0 disables it
    pub send_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            max_clients: DEFAULT_MAX_CLIENTS,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            send_timeout_ms: 0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("max_clients", DEFAULT_MAX_CLIENTS as i64)?
            .set_default("max_line_length", DEFAULT_MAX_LINE_LENGTH as i64)?
            .set_default("send_timeout_ms", 0_i64)?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("SMALLCHAT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.max_line_length == 0 {
            return Err(config::ConfigError::Message(
                "max_line_length must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as a listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get the send deadline, `None` when writes are unbounded
    pub fn send_timeout(&self) -> Option<Duration> {
        match self.send_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.max_clients, 256);
        assert_eq!(config.send_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_send_timeout_conversion() {
        let config = ServerConfig {
            send_timeout_ms: 250,
            ..ServerConfig::default()
        };
        assert_eq!(config.send_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = ServerConfig {
            max_clients: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
