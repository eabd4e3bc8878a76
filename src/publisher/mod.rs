//! Wall publishing module.
//!
//! The `Publisher` capability the conversation engine posts through,
//! and its VK implementation.

mod api;
mod vk;

pub use api::{Destination, MediaRef, PostId, PublishRequest, Publisher, PublisherError};
pub use vk::VkWallClient;
