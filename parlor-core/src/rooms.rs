//! Room directory, room creation form and cascading room deletion.

use tracing::{error, info, warn};

use crate::context::ServiceContext;
use crate::error::{ParlorError, ParlorResult};
use crate::models::{ChatRoom, NewChatRoom, DESCRIPTION_MAX_CHARS};

/// Outcome of deleting a room and everything in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomDeletion {
    pub messages_deleted: usize,
    pub media_deleted: usize,
    pub media_failed: usize,
}

/// Deletes each message (and its stored media) and then the room document.
///
/// Stops at the first document delete that fails, so a partial cascade is possible.
pub async fn delete_room(ctx: &ServiceContext, room_id: &str) -> ParlorResult<RoomDeletion> {
    let messages = ctx.list_messages(room_id).await?;
    let mut outcome = RoomDeletion::default();

    for message in &messages {
        if let Some(file_id) = message.media_file_id() {
            match ctx.files.delete_file(&file_id).await {
                Ok(()) => outcome.media_deleted += 1,
                Err(e) => {
                    warn!(file_id = %file_id, "Media cleanup failed: {}", e);
                    outcome.media_failed += 1;
                }
            }
        }
        ctx.delete_message_document(message.id()).await?;
        outcome.messages_deleted += 1;
    }

    ctx.delete_room_document(room_id).await?;
    info!(
        room = %room_id,
        messages = outcome.messages_deleted,
        media = outcome.media_deleted,
        "Room deleted"
    );
    Ok(outcome)
}

/// State behind the room list screen.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: Vec<ChatRoom>,
    refreshing: bool,
    loaded: bool,
    last_error: Option<String>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rooms(&self) -> &[ChatRoom] {
        &self.rooms
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// True once at least one fetch has finished.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded && self.rooms.is_empty()
    }

    /// Fetches the first page of rooms. A failed fetch keeps the previous list.
    pub async fn refresh(&mut self, ctx: &ServiceContext) {
        self.refreshing = true;
        match ctx.list_rooms().await {
            Ok(rooms) => {
                self.rooms = rooms;
                self.last_error = None;
            }
            Err(e) => {
                error!("Failed to fetch chat rooms: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
        self.refreshing = false;
        self.loaded = true;
    }

    pub fn find(&self, room_id: &str) -> Option<&ChatRoom> {
        self.rooms.iter().find(|r| r.id() == room_id)
    }

    pub fn forget(&mut self, room_id: &str) {
        self.rooms.retain(|r| r.id() != room_id);
    }
}

/// The new room form.
#[derive(Debug, Default, Clone)]
pub struct RoomForm {
    pub title: String,
    description: String,
    submitting: bool,
}

impl RoomForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Input past the character cap is dropped.
    pub fn set_description(&mut self, text: impl Into<String>) {
        self.description = text.into().chars().take(DESCRIPTION_MAX_CHARS).collect();
    }

    pub fn push_description(&mut self, c: char) {
        if self.description.chars().count() < DESCRIPTION_MAX_CHARS {
            self.description.push(c);
        }
    }

    pub fn description_counter(&self) -> String {
        format!(
            "{}/{}",
            self.description.chars().count(),
            DESCRIPTION_MAX_CHARS
        )
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.title.trim().is_empty()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Creates the room. Refuses while a submission is in flight.
    pub async fn submit(&mut self, ctx: &ServiceContext) -> ParlorResult<ChatRoom> {
        if self.submitting {
            return Err(ParlorError::ValidationError(
                "Room creation already in progress".to_string(),
            ));
        }
        let new_room = NewChatRoom::new(&self.title, &self.description)?;

        self.submitting = true;
        let result = ctx.create_room(&new_room).await;
        self.submitting = false;

        match result {
            Ok(room) => {
                info!(room = %room.id(), title = %room.title, "Chat room created");
                *self = Self::default();
                Ok(room)
            }
            Err(e) => {
                error!("Error creating chat room: {}", e);
                Err(e)
            }
        }
    }
}
