//! Events consumed by the conversation state machine.

use std::fmt;
use std::path::PathBuf;

/// Kind of attachment that can start a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Document,
    Photo,
}

/// Raw attachment content. Debug-prints as a byte count to keep event
/// logging readable.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaBytes(pub Vec<u8>);

impl fmt::Debug for MediaBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0.len())
    }
}

impl From<Vec<u8>> for MediaBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Which remote interaction failed, fed back into the machine as part of
/// a completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFailure {
    /// The attachment could not be written to local storage.
    Staging,
    /// The publishing service rejected the configured credentials.
    Authentication,
    /// Uploading the staged media failed.
    Upload,
    /// Creating the wall post failed.
    Post,
    /// The post was created but its URL could not be resolved.
    ShareUrl,
}

/// An input to the state machine.
///
/// `Attachment`, `Text`, `ButtonPressed`, and `Cancel` come from the chat
/// transport. `SetupFinished` and `PublishFinished` are completions of
/// remote work started by an earlier transition; the engine feeds them
/// back once the corresponding effect has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A document or photo arrived; starts a conversation.
    Attachment {
        kind: AttachmentKind,
        content: MediaBytes,
    },

    /// A plain text message.
    Text { text: String },

    /// An inline button was pressed.
    ButtonPressed { payload: String },

    /// The explicit cancel command.
    Cancel,

    /// Media staging and publisher authentication completed.
    SetupFinished(Result<PathBuf, RemoteFailure>),

    /// The publish attempt completed, with the share URL on success.
    PublishFinished(Result<String, RemoteFailure>),
}
