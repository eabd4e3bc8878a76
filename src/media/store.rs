//! Local staging of incoming attachments.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

const STAGED_FILE_NAME: &str = "incoming.png";

/// Errors from staging media.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Failed to create media directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to write staged media {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Stages attachment bytes under a per-chat directory.
///
/// Each chat has a single staging slot that is overwritten when a new
/// conversation starts, so conversations in different chats cannot
/// clobber each other's media.
#[derive(Debug, Clone)]
pub struct MediaStore {
    base_dir: PathBuf,
}

impl MediaStore {
    /// Creates a store rooted at `base_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Writes `content` to the chat's staging slot and returns its path.
    pub fn stage(&self, chat_id: i64, content: &[u8]) -> Result<PathBuf, MediaError> {
        let dir = self.base_dir.join(chat_id.to_string());
        fs::create_dir_all(&dir).map_err(|source| MediaError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(STAGED_FILE_NAME);
        fs::write(&path, content).map_err(|source| MediaError::Write {
            path: path.clone(),
            source,
        })?;

        debug!("Staged {} bytes at {}", content.len(), path.display());
        Ok(path)
    }

    /// Root directory of the store.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
