//! Conversation states and per-conversation session data.

use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::calendar::CalendarCursor;

/// Mutable data collected over one conversation.
///
/// Fields are populated monotonically as the dialog advances and the
/// whole session is discarded on any terminal outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Caption for the post, set once while awaiting the description.
    pub caption: Option<String>,

    /// Publish timestamp: the picked date at midnight, then refined by
    /// the `HH:MM` input. Only the time-refined value reaches a publish
    /// request.
    pub scheduled_at: Option<NaiveDateTime>,

    /// Where the incoming attachment was staged.
    pub media_path: Option<PathBuf>,
}

impl Session {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Where a conversation currently is in the posting dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    /// Media is being staged and the publisher session established.
    Authorizing,

    /// Waiting for the caption text.
    AwaitingCaption,

    /// Waiting for the "Now" / "Other date" choice.
    AwaitingTimingChoice,

    /// The calendar is shown; waiting for a day or a navigation press.
    AwaitingDatePick { cursor: CalendarCursor },

    /// A date is stored; waiting for the clock time.
    AwaitingTime,

    /// A publish request is in flight.
    Publishing,
}
