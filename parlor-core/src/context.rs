use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::assistant::{AssistantClient, GeminiClient, ReplyOptions};
use crate::backend::{
    channels, AppwriteClient, AppwriteRealtime, DocumentStore, FileStore, InMemoryBackend,
    Query, RealtimeSource, LIST_LIMIT,
};
use crate::config::ParlorConfig;
use crate::error::ParlorResult;
use crate::models::{ChatRoom, Message, NewChatRoom, NewMessage};

/// Database and collection ids every document call is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub database: String,
    pub chatrooms: String,
    pub messages: String,
}

/// Explicitly constructed handle passed to every surface.
#[derive(Clone)]
pub struct ServiceContext {
    pub documents: Arc<dyn DocumentStore>,
    pub files: Arc<dyn FileStore>,
    pub realtime: Arc<dyn RealtimeSource>,
    pub assistant: Arc<dyn AssistantClient>,
    pub reply_options: ReplyOptions,
    pub collections: Collections,
}

impl ServiceContext {
    /// HTTP backend, websocket realtime and the Gemini assistant.
    pub fn from_config(config: &ParlorConfig) -> ParlorResult<Self> {
        let backend = Arc::new(AppwriteClient::new(&config.backend)?);
        Ok(Self {
            documents: backend.clone(),
            files: backend,
            realtime: Arc::new(AppwriteRealtime::new(&config.backend)),
            assistant: Arc::new(GeminiClient::new(&config.assistant)),
            reply_options: ReplyOptions::from(&config.assistant),
            collections: Collections::from(config),
        })
    }

    /// Everything backed by one in-memory store.
    pub fn in_memory(
        config: &ParlorConfig,
        backend: Arc<InMemoryBackend>,
        assistant: Arc<dyn AssistantClient>,
    ) -> Self {
        Self {
            documents: backend.clone(),
            files: backend.clone(),
            realtime: backend,
            assistant,
            reply_options: ReplyOptions::from(&config.assistant),
            collections: Collections::from(config),
        }
    }

    pub async fn list_rooms(&self) -> ParlorResult<Vec<ChatRoom>> {
        let list = self
            .documents
            .list_documents(&self.collections.chatrooms, &[Query::limit(LIST_LIMIT)])
            .await?;
        decode_all(list.documents)
    }

    pub async fn get_room(&self, room_id: &str) -> ParlorResult<ChatRoom> {
        let raw = self
            .documents
            .get_document(&self.collections.chatrooms, room_id)
            .await?;
        Ok(serde_json::from_value(raw)?)
    }

    pub async fn create_room(&self, room: &NewChatRoom) -> ParlorResult<ChatRoom> {
        let raw = self
            .documents
            .create_document(&self.collections.chatrooms, serde_json::to_value(room)?)
            .await?;
        Ok(serde_json::from_value(raw)?)
    }

    /// Bumps the room's activity timestamp. Failures are logged only.
    pub async fn touch_room(&self, room_id: &str) {
        let now = chrono::Utc::now().to_rfc3339();
        if let Err(e) = self
            .documents
            .update_document(
                &self.collections.chatrooms,
                room_id,
                json!({ "$updatedAt": now }),
            )
            .await
        {
            warn!(room = %room_id, "Room activity touch failed: {}", e);
        }
    }

    pub async fn delete_room_document(&self, room_id: &str) -> ParlorResult<()> {
        self.documents
            .delete_document(&self.collections.chatrooms, room_id)
            .await
    }

    /// Newest messages first from the backend, returned oldest first.
    pub async fn list_messages(&self, room_id: &str) -> ParlorResult<Vec<Message>> {
        let queries = [
            Query::equal("chatRoomId", room_id),
            Query::limit(LIST_LIMIT),
            Query::order_desc("$createdAt"),
        ];
        let list = self
            .documents
            .list_documents(&self.collections.messages, &queries)
            .await?;
        let mut messages: Vec<Message> = decode_all(list.documents)?;
        messages.reverse();
        debug!(room = %room_id, count = messages.len(), "Fetched messages");
        Ok(messages)
    }

    pub async fn get_message(&self, message_id: &str) -> ParlorResult<Message> {
        let raw = self
            .documents
            .get_document(&self.collections.messages, message_id)
            .await?;
        Ok(serde_json::from_value(raw)?)
    }

    pub async fn create_message(&self, message: &NewMessage) -> ParlorResult<Message> {
        let raw = self
            .documents
            .create_document(&self.collections.messages, serde_json::to_value(message)?)
            .await?;
        Ok(serde_json::from_value(raw)?)
    }

    pub async fn delete_message_document(&self, message_id: &str) -> ParlorResult<()> {
        self.documents
            .delete_document(&self.collections.messages, message_id)
            .await
    }

    /// The room document itself plus the whole messages collection, filtered client-side.
    pub fn room_channels(&self, room_id: &str) -> Vec<String> {
        vec![
            channels::document(
                &self.collections.database,
                &self.collections.chatrooms,
                room_id,
            ),
            channels::collection_documents(
                &self.collections.database,
                &self.collections.messages,
            ),
        ]
    }
}

impl From<&ParlorConfig> for Collections {
    fn from(config: &ParlorConfig) -> Self {
        Self {
            database: config.backend.database_id.clone(),
            chatrooms: config.backend.chatrooms_collection_id.clone(),
            messages: config.backend.messages_collection_id.clone(),
        }
    }
}

/// Documents that do not decode are logged and skipped.
fn decode_all<T: serde::de::DeserializeOwned>(documents: Vec<Value>) -> ParlorResult<Vec<T>> {
    Ok(documents
        .into_iter()
        .filter_map(|d| {
            let id = d
                .get("$id")
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string();
            match serde_json::from_value(d) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!(document = %id, "Skipping undecodable document: {}", e);
                    None
                }
            }
        })
        .collect())
}
