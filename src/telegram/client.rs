//! Telegram Bot API client.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::types::{Message, ReplyMarkup, TelegramFile, Update};

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),

    #[error("Telegram file has no downloadable path")]
    MissingFilePath,
}

/// Thin client over the Bot HTTP API.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    /// Creates a client for the given bot token.
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://api.telegram.org".to_owned(),
            token,
        }
    }

    /// Long-polls for updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: Some(vec!["message", "callback_query"]),
        };
        self.post("getUpdates", &request).await
    }

    /// Sends a text message, optionally with reply markup.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<Message, TelegramError> {
        let request = SendMessageRequest {
            chat_id,
            text,
            reply_markup,
        };
        self.post("sendMessage", &request).await
    }

    /// Replaces the inline keyboard on a previously sent message.
    pub async fn edit_message_reply_markup(
        &self,
        chat_id: i64,
        message_id: i64,
        reply_markup: ReplyMarkup,
    ) -> Result<(), TelegramError> {
        // The API returns either the edited message or `true`.
        let _: serde_json::Value = self
            .post(
                "editMessageReplyMarkup",
                &EditReplyMarkupRequest {
                    chat_id,
                    message_id,
                    reply_markup,
                },
            )
            .await?;
        Ok(())
    }

    /// Acknowledges a callback query so the client stops its spinner.
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
    ) -> Result<(), TelegramError> {
        let _: bool = self
            .post(
                "answerCallbackQuery",
                &AnswerCallbackRequest { callback_query_id },
            )
            .await?;
        Ok(())
    }

    /// Resolves a file id to its download path.
    pub async fn get_file(&self, file_id: &str) -> Result<TelegramFile, TelegramError> {
        self.post("getFile", &GetFileRequest { file_id }).await
    }

    /// Downloads file content by the path returned from `get_file`.
    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>, TelegramError> {
        let url = format!("{}/file/bot{}/{}", self.base_url, self.token, file_path);
        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            return Err(TelegramError::Api(format!(
                "file download failed with status {}",
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Downloads the content behind a file id.
    pub async fn download_by_id(&self, file_id: &str) -> Result<Vec<u8>, TelegramError> {
        let file = self.get_file(file_id).await?;
        let file_path = file.file_path.ok_or(TelegramError::MissingFilePath)?;
        debug!("Downloading Telegram file {}", file_path);
        self.download_file(&file_path).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, TelegramError> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        let response = self.http.post(url).json(body).send().await?;

        let payload: TelegramResponse<T> = response.json().await?;
        if !payload.ok {
            return Err(TelegramError::Api(
                payload
                    .description
                    .unwrap_or_else(|| "unknown Telegram API error".to_owned()),
            ));
        }

        payload
            .result
            .ok_or_else(|| TelegramError::Api("missing result".to_owned()))
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct TelegramResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_updates: Option<Vec<&'static str>>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Serialize)]
struct EditReplyMarkupRequest {
    chat_id: i64,
    message_id: i64,
    reply_markup: ReplyMarkup,
}

#[derive(Debug, Serialize)]
struct AnswerCallbackRequest<'a> {
    callback_query_id: &'a str,
}

#[derive(Debug, Serialize)]
struct GetFileRequest<'a> {
    file_id: &'a str,
}
