//! Session registry and effect execution.
//!
//! The engine owns one session per chat, funnels inbound events through
//! the transition function, and performs the effects it emits: outbound
//! chat actions through [`ChatOutbound`] and remote commands through the
//! publisher and media store. Remote completions are fed back into the
//! machine as events before the next inbound event is accepted.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use tracing::{debug, error, info, warn};

use super::effect::{Effect, PublishIntent};
use super::event::{AttachmentKind, Event, MediaBytes, RemoteFailure};
use super::state::{ConversationState, Session};
use super::transition::{Step, Transition, entry, transition};
use crate::calendar::InlineGrid;
use crate::media::MediaStore;
use crate::publisher::{Destination, PublishRequest, Publisher};

/// Chat identifier used to key sessions.
pub type ChatId = i64;

/// Outbound chat actions the engine can perform.
#[async_trait]
pub trait ChatOutbound: Send + Sync {
    /// Sends a plain text message.
    async fn send_text(&self, chat: ChatId, text: &str) -> anyhow::Result<()>;

    /// Sends a text with a one-time reply keyboard of choices.
    async fn send_text_with_choices(
        &self,
        chat: ChatId,
        text: &str,
        choices: &[String],
    ) -> anyhow::Result<()>;

    /// Sends a text with an inline button grid.
    async fn send_text_with_grid(
        &self,
        chat: ChatId,
        text: &str,
        grid: &InlineGrid,
    ) -> anyhow::Result<()>;

    /// Replaces the grid on the last grid message sent to this chat.
    async fn edit_grid(&self, chat: ChatId, grid: &InlineGrid) -> anyhow::Result<()>;

    /// Sends a text while removing any open reply keyboard.
    async fn remove_keyboard(&self, chat: ChatId, text: &str) -> anyhow::Result<()>;
}

/// Drives every active conversation.
///
/// One inbound event is fully processed, including the effects and
/// completions it triggers, before the caller hands over the next one.
pub struct ConversationEngine {
    chat: Arc<dyn ChatOutbound>,
    publisher: Arc<dyn Publisher>,
    media: MediaStore,
    destination: Destination,
    sessions: HashMap<ChatId, (ConversationState, Session)>,
}

impl ConversationEngine {
    /// Creates an engine wired to its collaborators.
    #[must_use]
    pub fn new(
        chat: Arc<dyn ChatOutbound>,
        publisher: Arc<dyn Publisher>,
        media: MediaStore,
        destination: Destination,
    ) -> Self {
        Self {
            chat,
            publisher,
            media,
            destination,
            sessions: HashMap::new(),
        }
    }

    /// Number of conversations currently in flight.
    #[must_use]
    pub fn active_conversations(&self) -> usize {
        self.sessions.len()
    }

    /// Feeds one inbound event into the machine for `chat_id`.
    pub async fn handle_event(&mut self, chat_id: ChatId, event: Event) {
        let mut pending = Some(event);
        while let Some(event) = pending.take() {
            pending = self.step(chat_id, event).await;
        }
    }

    /// Processes one event, returning the completion event of any remote
    /// command it triggered.
    async fn step(&mut self, chat_id: ChatId, event: Event) -> Option<Event> {
        if !self.sessions.contains_key(&chat_id) {
            return match event {
                Event::Attachment { kind, content } => {
                    info!("Conversation started in chat {}", chat_id);
                    self.sessions
                        .insert(chat_id, (ConversationState::Authorizing, Session::new()));
                    self.apply(chat_id, entry(kind, content)).await
                }
                event => {
                    debug!(
                        "No active conversation in chat {}, dropping {:?}",
                        chat_id, event
                    );
                    None
                }
            };
        }

        let today = Local::now().date_naive();
        let outcome = {
            let Some((state, session)) = self.sessions.get_mut(&chat_id) else {
                return None;
            };
            transition(state, session, event, today)
        };

        match outcome {
            Ok(result) => self.apply(chat_id, result).await,
            Err(unhandled) => {
                warn!(
                    "Dropped event in chat {}: no transition from {:?} for {:?}",
                    chat_id, unhandled.state, unhandled.event
                );
                None
            }
        }
    }

    /// Commits the step, then runs the effects against the collaborators.
    async fn apply(&mut self, chat_id: ChatId, result: Transition) -> Option<Event> {
        match result.step {
            Step::Continue(next) => {
                if let Some((state, _)) = self.sessions.get_mut(&chat_id) {
                    *state = next;
                }
            }
            Step::End(reason) => {
                info!("Conversation in chat {} ended: {:?}", chat_id, reason);
                self.sessions.remove(&chat_id);
            }
        }

        let mut follow_up = None;
        for effect in result.effects {
            if let Some(event) = self.run_effect(chat_id, effect).await {
                follow_up = Some(event);
            }
        }
        follow_up
    }

    async fn run_effect(&self, chat_id: ChatId, effect: Effect) -> Option<Event> {
        match effect {
            Effect::SendText { text } => {
                log_delivery(self.chat.send_text(chat_id, &text).await);
                None
            }
            Effect::SendTextWithChoices { text, choices } => {
                log_delivery(
                    self.chat
                        .send_text_with_choices(chat_id, &text, &choices)
                        .await,
                );
                None
            }
            Effect::SendTextWithGrid { text, grid } => {
                log_delivery(self.chat.send_text_with_grid(chat_id, &text, &grid).await);
                None
            }
            Effect::EditGrid { grid } => {
                log_delivery(self.chat.edit_grid(chat_id, &grid).await);
                None
            }
            Effect::RemoveKeyboard { text } => {
                log_delivery(self.chat.remove_keyboard(chat_id, &text).await);
                None
            }
            Effect::PrepareConversation { kind, content } => {
                Some(Event::SetupFinished(
                    self.prepare(chat_id, kind, &content).await,
                ))
            }
            Effect::Publish(intent) => Some(Event::PublishFinished(self.publish(intent).await)),
        }
    }

    /// Stages the attachment and authenticates to the publisher.
    async fn prepare(
        &self,
        chat_id: ChatId,
        kind: AttachmentKind,
        content: &MediaBytes,
    ) -> Result<PathBuf, RemoteFailure> {
        debug!("Staging {:?} attachment for chat {}", kind, chat_id);
        let path = match self.media.stage(chat_id, &content.0) {
            Ok(path) => path,
            Err(e) => {
                warn!("Failed to stage media for chat {}: {}", chat_id, e);
                return Err(RemoteFailure::Staging);
            }
        };

        info!("Media staged, trying to login");
        if let Err(e) = self.publisher.authenticate().await {
            error!("Can't login to the wall service: {}", e);
            return Err(RemoteFailure::Authentication);
        }

        Ok(path)
    }

    /// Uploads the media, creates the post, and resolves its URL.
    async fn publish(&self, intent: PublishIntent) -> Result<String, RemoteFailure> {
        info!("Trying to post");

        let media = self
            .publisher
            .stage_media(&intent.media_path, &self.destination)
            .await
            .map_err(|e| {
                error!("Media upload failed: {}", e);
                RemoteFailure::Upload
            })?;

        let request = PublishRequest {
            caption: intent.caption,
            media,
            scheduled_at: intent.scheduled_at,
            destination: self.destination.clone(),
        };

        let post = self.publisher.create_post(&request).await.map_err(|e| {
            error!("Wall post failed: {}", e);
            RemoteFailure::Post
        })?;

        self.publisher
            .resolve_share_url(&self.destination, &post)
            .await
            .map_err(|e| {
                error!("Share URL lookup failed: {}", e);
                RemoteFailure::ShareUrl
            })
    }
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("destination", &self.destination)
            .field("active", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

fn log_delivery(result: anyhow::Result<()>) {
    if let Err(e) = result {
        warn!("Outbound chat action failed: {:#}", e);
    }
}
