//! Effects produced by state transitions.

use std::path::PathBuf;

use chrono::NaiveDateTime;

use super::event::{AttachmentKind, MediaBytes};
use crate::calendar::InlineGrid;

/// Everything the machine has collected for a publish attempt. The
/// engine turns this into the publisher's request once the media has
/// been uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishIntent {
    /// Caption for the post.
    pub caption: String,

    /// Locally staged media to upload.
    pub media_path: PathBuf,

    /// Publish time; `None` posts immediately.
    pub scheduled_at: Option<NaiveDateTime>,
}

/// Work the engine performs after a transition, in order.
///
/// The first five are outbound chat actions. The last two are remote
/// commands whose completions re-enter the machine as events.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Send a plain text message.
    SendText { text: String },

    /// Send a text with a one-time choice keyboard.
    SendTextWithChoices { text: String, choices: Vec<String> },

    /// Send a text with an inline button grid.
    SendTextWithGrid { text: String, grid: InlineGrid },

    /// Replace the grid on the previously sent grid message.
    EditGrid { grid: InlineGrid },

    /// Send a text while removing any open reply keyboard.
    RemoveKeyboard { text: String },

    /// Stage the attachment locally and authenticate to the publisher.
    PrepareConversation {
        kind: AttachmentKind,
        content: MediaBytes,
    },

    /// Publish the staged media with the collected caption.
    Publish(PublishIntent),
}
