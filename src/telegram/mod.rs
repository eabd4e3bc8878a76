//! Telegram transport module.
//!
//! A thin Bot API client (long polling, messages, keyboards, file
//! download) and the gateway that turns the state machine's outbound
//! actions into API calls.

mod client;
mod gateway;
mod types;

pub use client::{TelegramClient, TelegramError};
pub use gateway::TelegramGateway;
pub use types::{
    CallbackQuery, Chat, Document, Message, PhotoSize, ReplyMarkup, TelegramFile, Update, User,
    best_photo,
};
