//! Configuration module for the wall post bot.
//!
//! Handles loading and validation of bot configuration from the
//! environment: Telegram credentials, VK credentials, and runtime settings.

mod settings;

pub use settings::{BotSettings, ConfigError, PublisherConfig, TelegramConfig};
