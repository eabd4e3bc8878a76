//! Publisher interface and request types.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDateTime;

/// Identifies the wall the bot posts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Community (group) identifier, without the leading minus.
    pub group_id: u64,
}

impl Destination {
    /// Creates a destination for a community wall.
    #[must_use]
    pub const fn new(group_id: u64) -> Self {
        Self { group_id }
    }

    /// Wall owner identifier as the API expects it (negated for groups).
    #[must_use]
    pub fn owner_id(&self) -> String {
        format!("-{}", self.group_id)
    }
}

/// Reference to media already stored on the publishing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef(String);

impl MediaRef {
    /// Wraps a service-side media reference.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a created wall post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostId(pub i64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fully assembled post, built immediately before publishing and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    /// Caption text for the post.
    pub caption: String,

    /// Media to attach, already staged on the service.
    pub media: MediaRef,

    /// Publish time; `None` posts immediately.
    pub scheduled_at: Option<NaiveDateTime>,

    /// Wall to post to.
    pub destination: Destination,
}

/// Errors from the publishing service.
#[derive(Debug, thiserror::Error)]
pub enum PublisherError {
    #[error("Authentication with the wall service failed: {0}")]
    Authentication(String),

    #[error("Media upload failed: {0}")]
    Upload(String),

    #[error("Creating the wall post failed: {0}")]
    Post(String),

    #[error("Resolving the share URL failed: {0}")]
    ShareUrl(String),
}

/// Capability to store media and create timed or immediate wall posts.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Establishes a session with the service using configured credentials.
    ///
    /// Failure ends the current conversation; there is no retry.
    async fn authenticate(&self) -> Result<(), PublisherError>;

    /// Uploads the staged file and returns a reference usable in a post.
    async fn stage_media(
        &self,
        local_path: &Path,
        destination: &Destination,
    ) -> Result<MediaRef, PublisherError>;

    /// Creates the wall post and returns its identifier.
    async fn create_post(&self, request: &PublishRequest) -> Result<PostId, PublisherError>;

    /// Resolves the public URL of a created post.
    async fn resolve_share_url(
        &self,
        destination: &Destination,
        post: &PostId,
    ) -> Result<String, PublisherError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_id_is_negated() {
        assert_eq!(Destination::new(123).owner_id(), "-123");
    }

    #[test]
    fn test_media_ref_display() {
        assert_eq!(MediaRef::new("photo1_2").to_string(), "photo1_2");
    }
}
