//! Application settings: Telegram, VK, and runtime configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token (obtain from `@BotFather`).
    pub bot_token: String,
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(bot_token: String) -> Self {
        Self { bot_token }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `TG_BOT_TOKEN` to be set.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is missing or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = std::env::var("TG_BOT_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("TG_BOT_TOKEN"))?;

        if bot_token.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("TG_BOT_TOKEN"));
        }

        Ok(Self { bot_token })
    }
}

/// VK publishing configuration.
///
/// The access token must already carry wall and photos permissions;
/// obtaining one is outside the bot's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Pre-obtained VK access token.
    pub access_token: String,

    /// Target community (group) identifier, without the leading minus.
    pub group_id: u64,
}

impl PublisherConfig {
    /// Creates a new publisher configuration.
    #[must_use]
    pub fn new(access_token: String, group_id: u64) -> Self {
        Self {
            access_token,
            group_id,
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `VK_ACCESS_TOKEN` and `VK_GROUP_ID` to be set.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let access_token = std::env::var("VK_ACCESS_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("VK_ACCESS_TOKEN"))?;

        if access_token.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("VK_ACCESS_TOKEN"));
        }

        let group_id = std::env::var("VK_GROUP_ID")
            .map_err(|_| ConfigError::MissingEnvVar("VK_GROUP_ID"))?
            .parse()
            .map_err(|_| ConfigError::InvalidGroupId)?;

        Ok(Self {
            access_token,
            group_id,
        })
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Directory where incoming attachments are staged.
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    /// Long-poll timeout for fetching updates, in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Log level for the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("media")
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            media_dir: default_media_dir(),
            poll_timeout_secs: default_poll_timeout(),
            log_level: default_log_level(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            media_dir: std::env::var("MEDIA_DIR")
                .map_or_else(|_| default_media_dir(), PathBuf::from),
            poll_timeout_secs: std::env::var("POLL_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_poll_timeout),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| default_log_level()),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid VK group ID (must be a positive integer)")]
    InvalidGroupId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = BotSettings::default();
        assert_eq!(settings.media_dir, PathBuf::from("media"));
        assert_eq!(settings.poll_timeout_secs, 30);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_telegram_config_new() {
        let config = TelegramConfig::new("123:abc".to_owned());
        assert_eq!(config.bot_token, "123:abc");
    }

    #[test]
    fn test_publisher_config_new() {
        let config = PublisherConfig::new("token".to_owned(), 4242);
        assert_eq!(config.group_id, 4242);
    }
}
