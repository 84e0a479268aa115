use serde::{Deserialize, Serialize};

use super::DocumentMeta;
use crate::error::{ParlorError, ParlorResult};

/// Longest description the creation form accepts.
pub const DESCRIPTION_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRoom {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl ChatRoom {
    pub fn id(&self) -> &str {
        &self.meta.id
    }
}

/// Fields written when a room is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChatRoom {
    pub title: String,
    pub description: String,
}

impl NewChatRoom {
    /// Builds a room from form input. Only an empty title is rejected.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> ParlorResult<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(ParlorError::ValidationError(
                "Room title is required".to_string(),
            ));
        }
        let description: String = description
            .into()
            .trim()
            .chars()
            .take(DESCRIPTION_MAX_CHARS)
            .collect();
        Ok(Self { title, description })
    }
}
