//! Conversation state machine module.
//!
//! Drives the guided posting dialog: an explicit state enum, a pure
//! transition function, and an engine that keys sessions by chat id and
//! executes the effects transitions emit.

mod effect;
mod engine;
mod event;
mod state;
mod transition;

pub use effect::{Effect, PublishIntent};
pub use engine::{ChatId, ChatOutbound, ConversationEngine};
pub use event::{AttachmentKind, Event, MediaBytes, RemoteFailure};
pub use state::{ConversationState, Session};
pub use transition::{EndReason, Step, Transition, Unhandled, entry, transition};
