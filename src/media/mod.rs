//! Media staging module.
//!
//! Writes incoming attachments to local storage so the publisher can
//! upload them from a file path.

mod store;

pub use store::{MediaError, MediaStore};
