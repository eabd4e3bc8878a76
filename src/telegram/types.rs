//! Telegram Bot API wire types.

use serde::{Deserialize, Serialize};

use crate::calendar::InlineGrid;

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default)]
    pub document: Option<Document>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    kind: String,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind == "private"
    }
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: i64,
    pub height: i64,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Document {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramFile {
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Picks the largest variant of a photo (Telegram sends several sizes).
#[must_use]
pub fn best_photo(photos: &[PhotoSize]) -> Option<&PhotoSize> {
    photos.iter().max_by_key(|photo| {
        let size = photo.file_size.unwrap_or(0);
        let area = u64::try_from(photo.width.max(0)).unwrap_or(0)
            * u64::try_from(photo.height.max(0)).unwrap_or(0);
        (size, area)
    })
}

/// Reply markup attached to an outgoing message.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    InlineKeyboard {
        inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
    },
    ReplyKeyboard {
        keyboard: Vec<Vec<KeyboardButton>>,
        one_time_keyboard: bool,
        resize_keyboard: bool,
    },
    Remove {
        remove_keyboard: bool,
    },
}

#[derive(Debug, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

impl ReplyMarkup {
    /// Inline keyboard from a button grid.
    #[must_use]
    pub fn inline(grid: &InlineGrid) -> Self {
        Self::InlineKeyboard {
            inline_keyboard: grid
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| InlineKeyboardButton {
                            text: button.label.clone(),
                            callback_data: button.payload.clone(),
                        })
                        .collect()
                })
                .collect(),
        }
    }

    /// One-time reply keyboard with a single row of choices.
    #[must_use]
    pub fn choices(choices: &[String]) -> Self {
        Self::ReplyKeyboard {
            keyboard: vec![
                choices
                    .iter()
                    .map(|choice| KeyboardButton {
                        text: choice.clone(),
                    })
                    .collect(),
            ],
            one_time_keyboard: true,
            resize_keyboard: true,
        }
    }

    /// Removes any open reply keyboard.
    #[must_use]
    pub fn remove() -> Self {
        Self::Remove {
            remove_keyboard: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::calendar::GridButton;

    #[test]
    fn test_best_photo_prefers_largest() {
        let photos = vec![
            PhotoSize {
                file_id: "small".to_owned(),
                width: 90,
                height: 90,
                file_size: Some(1_000),
            },
            PhotoSize {
                file_id: "large".to_owned(),
                width: 1280,
                height: 1280,
                file_size: Some(200_000),
            },
            PhotoSize {
                file_id: "medium".to_owned(),
                width: 320,
                height: 320,
                file_size: Some(20_000),
            },
        ];

        assert_eq!(best_photo(&photos).unwrap().file_id, "large");
        assert!(best_photo(&[]).is_none());
    }

    #[test]
    fn test_inline_markup_shape() {
        let grid: InlineGrid = vec![vec![GridButton::new("15", "cal:day:2024:6:15")]];
        let value = serde_json::to_value(ReplyMarkup::inline(&grid)).unwrap();

        assert_eq!(
            value,
            json!({
                "inline_keyboard": [[{"text": "15", "callback_data": "cal:day:2024:6:15"}]]
            })
        );
    }

    #[test]
    fn test_choices_markup_is_one_time() {
        let markup = ReplyMarkup::choices(&["Now".to_owned(), "Other date".to_owned()]);
        let value = serde_json::to_value(markup).unwrap();

        assert_eq!(value["one_time_keyboard"], json!(true));
        assert_eq!(value["keyboard"][0][1]["text"], json!("Other date"));
    }

    #[test]
    fn test_remove_markup() {
        let value = serde_json::to_value(ReplyMarkup::remove()).unwrap();
        assert_eq!(value, json!({"remove_keyboard": true}));
    }

    #[test]
    fn test_update_parsing_with_callback() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 5,
            "callback_query": {
                "id": "abc",
                "from": {"id": 42},
                "data": "cal:next:2024:6",
                "message": {
                    "message_id": 9,
                    "chat": {"id": 42, "type": "private"}
                }
            }
        }))
        .unwrap();

        let callback = update.callback_query.unwrap();
        assert_eq!(callback.data.as_deref(), Some("cal:next:2024:6"));
        assert!(callback.message.unwrap().chat.is_private());
    }
}
