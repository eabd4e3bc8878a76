//! Wall Post Bot - Main Entry Point
//!
//! A Telegram bot that walks the user from an incoming image to a
//! published (or scheduled) post on a VK community wall.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use wall_post_bot::config::{BotSettings, PublisherConfig, TelegramConfig};
use wall_post_bot::conversation::{AttachmentKind, ConversationEngine, Event};
use wall_post_bot::media::MediaStore;
use wall_post_bot::publisher::{Destination, VkWallClient};
use wall_post_bot::telegram::{Message, TelegramClient, TelegramGateway, Update, best_photo};

/// Command that aborts the current conversation.
const CANCEL_COMMAND: &str = "/cancel";

/// Telegram bot that publishes captioned images to a VK community wall.
#[derive(Parser, Debug)]
#[command(name = "wall_post_bot")]
#[command(about = "Publish images from a Telegram chat to a VK wall")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // Load configurations
    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let vk_config = PublisherConfig::from_env()
        .context("Failed to load VK configuration from environment")?;

    let settings = BotSettings::from_env_with_defaults();

    info!("Starting wall post bot (group {})", vk_config.group_id);

    let client = TelegramClient::new(tg_config.bot_token);
    let gateway = Arc::new(TelegramGateway::new(client.clone()));
    let publisher = Arc::new(VkWallClient::new(&vk_config));
    let media = MediaStore::new(settings.media_dir.clone());
    let destination = Destination::new(vk_config.group_id);

    let mut engine = ConversationEngine::new(gateway, publisher, media, destination);

    run_polling_loop(
        &client,
        &mut engine,
        Duration::from_secs(settings.poll_timeout_secs),
    )
    .await
}

/// Long-polls Telegram and feeds updates into the engine until Ctrl+C.
async fn run_polling_loop(
    client: &TelegramClient,
    engine: &mut ConversationEngine,
    poll_timeout: Duration,
) -> Result<()> {
    let mut offset: Option<i64> = None;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Polling for updates...");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
            updates = client.get_updates(offset, poll_timeout) => {
                let updates = match updates {
                    Ok(updates) => updates,
                    Err(e) => {
                        warn!("Telegram polling error: {}", e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                };

                for update in updates {
                    offset = Some(update.update_id + 1);
                    handle_update(client, engine, update).await;
                }
            }
        }
    }

    Ok(())
}

/// Routes one update into the conversation engine.
async fn handle_update(client: &TelegramClient, engine: &mut ConversationEngine, update: Update) {
    if let Some(message) = update.message {
        if !message.chat.is_private() {
            debug!("Ignoring non-private chat {}", message.chat.id);
            return;
        }

        let chat_id = message.chat.id;
        match message_event(client, &message).await {
            Some(event) => engine.handle_event(chat_id, event).await,
            None => debug!("Ignoring unsupported message in chat {}", chat_id),
        }
    } else if let Some(callback) = update.callback_query {
        if let Err(e) = client.answer_callback_query(&callback.id).await {
            debug!("Failed to answer callback query: {}", e);
        }

        let Some(chat_id) = callback.message.as_ref().map(|m| m.chat.id) else {
            debug!("Callback query from user {} has no message", callback.from.id);
            return;
        };
        let Some(payload) = callback.data else {
            return;
        };

        engine
            .handle_event(chat_id, Event::ButtonPressed { payload })
            .await;
    }
}

/// Maps an inbound message to a state machine event, downloading the
/// attachment content when there is one.
async fn message_event(client: &TelegramClient, message: &Message) -> Option<Event> {
    if let Some(document) = message.document.as_ref() {
        return match client.download_by_id(&document.file_id).await {
            Ok(content) => Some(Event::Attachment {
                kind: AttachmentKind::Document,
                content: content.into(),
            }),
            Err(e) => {
                warn!("Failed to download document: {}", e);
                None
            }
        };
    }

    if let Some(photo) = message.photo.as_deref().and_then(best_photo) {
        return match client.download_by_id(&photo.file_id).await {
            Ok(content) => Some(Event::Attachment {
                kind: AttachmentKind::Photo,
                content: content.into(),
            }),
            Err(e) => {
                warn!("Failed to download photo: {}", e);
                None
            }
        };
    }

    let text = message.text.as_deref()?.trim();
    if text.is_empty() {
        return None;
    }
    if text == CANCEL_COMMAND {
        return Some(Event::Cancel);
    }

    Some(Event::Text {
        text: text.to_owned(),
    })
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
