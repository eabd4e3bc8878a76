//! Wall publishing over the VK HTTP API.

use std::path::Path;

use async_trait::async_trait;
use chrono::{Local, TimeZone};
use reqwest::multipart;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::api::{Destination, MediaRef, PostId, PublishRequest, Publisher, PublisherError};
use crate::config::PublisherConfig;

const VK_API_BASE: &str = "https://api.vk.com/method";
const VK_API_VERSION: &str = "5.199";

/// Publisher backed by the VK wall API.
///
/// Uses a pre-obtained access token; token acquisition is out of scope.
pub struct VkWallClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl VkWallClient {
    /// Creates a client from the publisher configuration.
    #[must_use]
    pub fn new(config: &PublisherConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: VK_API_BASE.to_owned(),
            access_token: config.access_token.clone(),
        }
    }

    /// Invokes an API method and unwraps the response envelope.
    ///
    /// Returns the error message only; callers map it to the variant
    /// matching the operation that failed.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T, String> {
        let url = format!("{}/{}", self.base_url, method);

        let mut form: Vec<(&str, String)> = vec![
            ("access_token", self.access_token.clone()),
            ("v", VK_API_VERSION.to_owned()),
        ];
        form.extend(params.iter().cloned());

        debug!("Calling VK method {}", method);

        let response = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let payload: VkResponse<T> = response
            .json()
            .await
            .map_err(|e| format!("malformed response: {e}"))?;

        if let Some(error) = payload.error {
            return Err(format!("API error {}: {}", error.error_code, error.error_msg));
        }

        payload.response.ok_or_else(|| "empty response".to_owned())
    }
}

#[async_trait]
impl Publisher for VkWallClient {
    async fn authenticate(&self) -> Result<(), PublisherError> {
        // A cheap call that fails fast on a bad or expired token.
        let users: Vec<VkUser> = self
            .call("users.get", &[])
            .await
            .map_err(PublisherError::Authentication)?;

        debug!(
            "Authenticated to VK as user {}",
            users.first().map_or(0, |user| user.id)
        );
        Ok(())
    }

    async fn stage_media(
        &self,
        local_path: &Path,
        destination: &Destination,
    ) -> Result<MediaRef, PublisherError> {
        info!("Uploading photo for the wall of group {}", destination.group_id);

        let upload: UploadServer = self
            .call(
                "photos.getWallUploadServer",
                &[("group_id", destination.group_id.to_string())],
            )
            .await
            .map_err(PublisherError::Upload)?;

        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| PublisherError::Upload(format!("cannot read staged media: {e}")))?;

        let file_name = local_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("photo.png")
            .to_owned();
        let form = multipart::Form::new()
            .part("photo", multipart::Part::bytes(bytes).file_name(file_name));

        let uploaded: UploadResult = self
            .http
            .post(&upload.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PublisherError::Upload(format!("upload request failed: {e}")))?
            .json()
            .await
            .map_err(|e| PublisherError::Upload(format!("malformed upload response: {e}")))?;

        let saved: Vec<SavedPhoto> = self
            .call(
                "photos.saveWallPhoto",
                &[
                    ("group_id", destination.group_id.to_string()),
                    ("photo", uploaded.photo),
                    ("server", uploaded.server.to_string()),
                    ("hash", uploaded.hash),
                ],
            )
            .await
            .map_err(PublisherError::Upload)?;

        let photo = saved
            .into_iter()
            .next()
            .ok_or_else(|| PublisherError::Upload("no photo in save response".to_owned()))?;

        Ok(MediaRef::new(format!("photo{}_{}", photo.owner_id, photo.id)))
    }

    async fn create_post(&self, request: &PublishRequest) -> Result<PostId, PublisherError> {
        info!("Posting to the wall of group {}", request.destination.group_id);

        let mut params = vec![
            ("owner_id", request.destination.owner_id()),
            ("message", request.caption.clone()),
            ("attachments", request.media.to_string()),
        ];
        if let Some(at) = request.scheduled_at {
            params.push(("publish_date", publish_timestamp(at).to_string()));
        }

        let posted: PostedWall = self
            .call("wall.post", &params)
            .await
            .map_err(PublisherError::Post)?;

        Ok(PostId(posted.post_id))
    }

    async fn resolve_share_url(
        &self,
        destination: &Destination,
        post: &PostId,
    ) -> Result<String, PublisherError> {
        info!("Generating share URL");

        let groups: GroupsResponse = self
            .call(
                "groups.getById",
                &[("group_id", destination.group_id.to_string())],
            )
            .await
            .map_err(PublisherError::ShareUrl)?;

        let group = groups
            .groups
            .into_iter()
            .next()
            .ok_or_else(|| PublisherError::ShareUrl("group not found".to_owned()))?;

        Ok(share_url(&group.screen_name, destination, post))
    }
}

/// Unix timestamp for a wall-clock publish time on the bot's host.
/// A DST-ambiguous time falls back to its UTC reading.
fn publish_timestamp(at: chrono::NaiveDateTime) -> i64 {
    Local
        .from_local_datetime(&at)
        .single()
        .map_or_else(|| at.and_utc().timestamp(), |local| local.timestamp())
}

fn share_url(screen_name: &str, destination: &Destination, post: &PostId) -> String {
    format!(
        "https://vk.com/{}?w=wall-{}_{}",
        screen_name, destination.group_id, post
    )
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct VkResponse<T> {
    #[serde(default)]
    response: Option<T>,
    #[serde(default)]
    error: Option<VkError>,
}

#[derive(Debug, Deserialize)]
struct VkError {
    error_code: i64,
    error_msg: String,
}

#[derive(Debug, Deserialize)]
struct VkUser {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct UploadServer {
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    server: i64,
    photo: String,
    hash: String,
}

#[derive(Debug, Deserialize)]
struct SavedPhoto {
    id: i64,
    owner_id: i64,
}

#[derive(Debug, Deserialize)]
struct PostedWall {
    post_id: i64,
}

#[derive(Debug, Deserialize)]
struct GroupsResponse {
    groups: Vec<Group>,
}

#[derive(Debug, Deserialize)]
struct Group {
    screen_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_url_format() {
        let url = share_url("cats_daily", &Destination::new(777), &PostId(42));
        assert_eq!(url, "https://vk.com/cats_daily?w=wall-777_42");
    }

    #[test]
    fn test_response_envelope_with_result() {
        let payload: VkResponse<PostedWall> =
            serde_json::from_str(r#"{"response": {"post_id": 15}}"#).unwrap();
        assert_eq!(payload.response.unwrap().post_id, 15);
        assert!(payload.error.is_none());
    }

    #[test]
    fn test_response_envelope_with_error() {
        let payload: VkResponse<PostedWall> = serde_json::from_str(
            r#"{"error": {"error_code": 5, "error_msg": "User authorization failed"}}"#,
        )
        .unwrap();
        assert!(payload.response.is_none());
        let error = payload.error.unwrap();
        assert_eq!(error.error_code, 5);
        assert_eq!(error.error_msg, "User authorization failed");
    }

    #[test]
    fn test_upload_result_parsing() {
        let uploaded: UploadResult = serde_json::from_str(
            r#"{"server": 885, "photo": "[]", "hash": "abc123"}"#,
        )
        .unwrap();
        assert_eq!(uploaded.server, 885);
        assert_eq!(uploaded.hash, "abc123");
    }
}
