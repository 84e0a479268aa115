//! Data access for the hosted backend.
//!
//! Screens and services talk to three narrow traits instead of an SDK handle:
//! [`DocumentStore`] for the document database, [`FileStore`] for the media
//! bucket and [`RealtimeSource`] for change notifications. [`appwrite`] and
//! [`realtime`] implement them over HTTP and websockets, [`memory`] keeps
//! everything in process for tests and the offline TUI.

pub mod appwrite;
pub mod memory;
pub mod query;
pub mod realtime;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ParlorResult;
use crate::models::DocumentList;

pub use appwrite::AppwriteClient;
pub use memory::{CallLog, InMemoryBackend};
pub use query::{Query, LIST_LIMIT};
pub use realtime::AppwriteRealtime;

/// Id the backend replaces with a generated one.
pub const UNIQUE_ID: &str = "unique()";

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(&self, collection: &str, data: Value) -> ParlorResult<Value>;

    async fn get_document(&self, collection: &str, id: &str) -> ParlorResult<Value>;

    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> ParlorResult<DocumentList<Value>>;

    async fn update_document(&self, collection: &str, id: &str, data: Value)
        -> ParlorResult<Value>;

    async fn delete_document(&self, collection: &str, id: &str) -> ParlorResult<()>;
}

/// A file stored in the media bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size_original: u64,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Streams a local file into the bucket.
    async fn upload_file(&self, path: &Path) -> ParlorResult<StoredFile>;

    /// Sends an in-memory buffer as a plain multipart request.
    async fn upload_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> ParlorResult<StoredFile>;

    /// Publicly dereferenceable URL for a stored file.
    fn view_url(&self, file_id: &str) -> String;

    async fn delete_file(&self, file_id: &str) -> ParlorResult<()>;
}

/// One change notification. Event kinds are carried but not interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl RealtimeEvent {
    /// True when the affected document is the room itself or one of its messages.
    pub fn concerns_room(&self, room_id: &str) -> bool {
        let field = |name: &str| self.payload.get(name).and_then(Value::as_str);
        field("chatRoomId") == Some(room_id) || field("$id") == Some(room_id)
    }

    pub fn sender_id(&self) -> Option<&str> {
        self.payload.get("senderId").and_then(Value::as_str)
    }
}

/// Live subscription. Dropping it stops delivery.
pub struct Subscription {
    receiver: mpsc::Receiver<RealtimeEvent>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(receiver: mpsc::Receiver<RealtimeEvent>, task: Option<JoinHandle<()>>) -> Self {
        Self { receiver, task }
    }

    pub async fn recv(&mut self) -> Option<RealtimeEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<RealtimeEvent> {
        self.receiver.try_recv().ok()
    }

    pub fn close(&mut self) {
        self.receiver.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

#[async_trait]
pub trait RealtimeSource: Send + Sync {
    async fn subscribe(&self, channels: Vec<String>) -> ParlorResult<Subscription>;
}

/// Channel names understood by the realtime endpoint.
pub mod channels {
    pub fn collection_documents(database: &str, collection: &str) -> String {
        format!("databases.{}.collections.{}.documents", database, collection)
    }

    pub fn document(database: &str, collection: &str, id: &str) -> String {
        format!(
            "databases.{}.collections.{}.documents.{}",
            database, collection, id
        )
    }

    /// Whether an event published on `published` reaches a subscriber of `subscribed`.
    pub fn covers(subscribed: &str, published: &str) -> bool {
        published == subscribed
            || published
                .strip_prefix(subscribed)
                .map(|rest| rest.starts_with('.'))
                .unwrap_or(false)
    }
}
