//! Outbound chat actions over the Telegram client.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::client::TelegramClient;
use super::types::ReplyMarkup;
use crate::calendar::InlineGrid;
use crate::conversation::{ChatId, ChatOutbound};

/// [`ChatOutbound`] implementation that talks to Telegram.
///
/// Remembers the message carrying the latest inline grid per chat so
/// calendar navigation can edit the grid in place.
pub struct TelegramGateway {
    client: TelegramClient,
    grid_messages: Mutex<HashMap<ChatId, i64>>,
}

impl TelegramGateway {
    /// Creates a gateway over the given client.
    #[must_use]
    pub fn new(client: TelegramClient) -> Self {
        Self {
            client,
            grid_messages: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ChatOutbound for TelegramGateway {
    async fn send_text(&self, chat: ChatId, text: &str) -> anyhow::Result<()> {
        self.client.send_message(chat, text, None).await?;
        Ok(())
    }

    async fn send_text_with_choices(
        &self,
        chat: ChatId,
        text: &str,
        choices: &[String],
    ) -> anyhow::Result<()> {
        self.client
            .send_message(chat, text, Some(ReplyMarkup::choices(choices)))
            .await?;
        Ok(())
    }

    async fn send_text_with_grid(
        &self,
        chat: ChatId,
        text: &str,
        grid: &InlineGrid,
    ) -> anyhow::Result<()> {
        let message = self
            .client
            .send_message(chat, text, Some(ReplyMarkup::inline(grid)))
            .await?;
        self.grid_messages
            .lock()
            .await
            .insert(chat, message.message_id);
        Ok(())
    }

    async fn edit_grid(&self, chat: ChatId, grid: &InlineGrid) -> anyhow::Result<()> {
        let message_id = self.grid_messages.lock().await.get(&chat).copied();
        let Some(message_id) = message_id else {
            anyhow::bail!("no grid message to edit in chat {chat}");
        };

        self.client
            .edit_message_reply_markup(chat, message_id, ReplyMarkup::inline(grid))
            .await?;
        Ok(())
    }

    async fn remove_keyboard(&self, chat: ChatId, text: &str) -> anyhow::Result<()> {
        self.client
            .send_message(chat, text, Some(ReplyMarkup::remove()))
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for TelegramGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramGateway").finish_non_exhaustive()
    }
}
