//! In-process backend used by tests and the offline TUI.
//!
//! Implements the same three traits as the HTTP client, evaluates list queries
//! locally, publishes realtime events on every write and records each call so
//! tests can assert how many requests an operation made.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};
use tracing::debug;
use uuid::Uuid;

use super::query::apply_queries;
use super::{
    channels, DocumentStore, FileStore, Query, RealtimeEvent, RealtimeSource, StoredFile,
    Subscription,
};
use crate::error::{ParlorError, ParlorResult};
use crate::models::{DocumentList, MessageKind};

/// One recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create { collection: String },
    Get { collection: String, id: String },
    List { collection: String },
    Update { collection: String, id: String },
    Delete { collection: String, id: String },
    UploadFile,
    UploadBytes,
    DeleteFile { id: String },
    Subscribe,
}

/// Shared request history.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    fn push(&self, call: Call) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    pub fn all(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.all().iter().filter(|c| predicate(c)).count()
    }

    pub fn creates_in(&self, collection: &str) -> usize {
        self.count(|c| matches!(c, Call::Create { collection: col } if col == collection))
    }

    pub fn deletes_in(&self, collection: &str) -> usize {
        self.count(|c| matches!(c, Call::Delete { collection: col, .. } if col == collection))
    }

    pub fn document_deletes(&self) -> usize {
        self.count(|c| matches!(c, Call::Delete { .. }))
    }

    pub fn file_deletes(&self) -> usize {
        self.count(|c| matches!(c, Call::DeleteFile { .. }))
    }

    pub fn uploads(&self) -> usize {
        self.count(|c| matches!(c, Call::UploadFile | Call::UploadBytes))
    }
}

#[derive(Default)]
struct State {
    collections: HashMap<String, Vec<Value>>,
    files: HashMap<String, (StoredFile, Vec<u8>)>,
}

pub struct InMemoryBackend {
    database_id: String,
    bucket_id: String,
    state: Mutex<State>,
    events: broadcast::Sender<RealtimeEvent>,
    calls: CallLog,
    epoch: DateTime<Utc>,
    ticks: AtomicI64,
    fail_writes: AtomicBool,
    fail_gets: AtomicBool,
    fail_streamed_uploads: AtomicBool,
    fail_uploads: AtomicBool,
    fail_file_deletes: AtomicBool,
}

impl InMemoryBackend {
    pub fn new(database_id: impl Into<String>, bucket_id: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            database_id: database_id.into(),
            bucket_id: bucket_id.into(),
            state: Mutex::new(State::default()),
            events,
            calls: CallLog::default(),
            epoch: Utc::now(),
            ticks: AtomicI64::new(0),
            fail_writes: AtomicBool::new(false),
            fail_gets: AtomicBool::new(false),
            fail_streamed_uploads: AtomicBool::new(false),
            fail_uploads: AtomicBool::new(false),
            fail_file_deletes: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    /// Makes document create/update/delete fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes single-document reads fail as if the backend were unreachable.
    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    /// Makes only the streamed upload fail so the buffered fallback runs.
    pub fn fail_streamed_uploads(&self, fail: bool) {
        self.fail_streamed_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_file_deletes(&self, fail: bool) {
        self.fail_file_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn document_count(&self, collection: &str) -> usize {
        self.state
            .lock()
            .map(|s| s.collections.get(collection).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn file_count(&self) -> usize {
        self.state.lock().map(|s| s.files.len()).unwrap_or(0)
    }

    /// Stores a document without recording a call or publishing an event.
    pub fn insert(&self, collection: &str, data: Value) -> ParlorResult<Value> {
        let document = self.stamp(collection, data)?;
        let mut state = self.lock()?;
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    /// Pushes an arbitrary event to every matching subscriber.
    pub fn publish(&self, event: RealtimeEvent) {
        let _ = self.events.send(event);
    }

    fn next_timestamp(&self) -> String {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        (self.epoch + ChronoDuration::milliseconds(tick))
            .to_rfc3339_opts(SecondsFormat::Millis, false)
    }

    fn lock(&self) -> ParlorResult<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| ParlorError::Internal("in-memory backend lock poisoned".to_string()))
    }

    fn stamp(&self, collection: &str, data: Value) -> ParlorResult<Value> {
        let Value::Object(mut fields) = data else {
            return Err(ParlorError::ValidationError(
                "document data must be an object".to_string(),
            ));
        };
        let now = self.next_timestamp();
        fields.insert("$id".into(), json!(Uuid::new_v4().simple().to_string()));
        fields.insert("$createdAt".into(), json!(now));
        fields.insert("$updatedAt".into(), json!(now));
        fields.insert("$permissions".into(), json!([]));
        fields.insert("$databaseId".into(), json!(self.database_id));
        fields.insert("$collectionId".into(), json!(collection));
        Ok(Value::Object(fields))
    }

    fn emit(&self, collection: &str, document: &Value, action: &str) {
        let id = document.get("$id").and_then(Value::as_str).unwrap_or("");
        let specific = channels::document(&self.database_id, collection, id);
        let event = RealtimeEvent {
            events: vec![format!("{}.{}", specific, action)],
            channels: vec![
                channels::collection_documents(&self.database_id, collection),
                specific,
            ],
            timestamp: Some(self.next_timestamp()),
            payload: document.clone(),
        };
        let _ = self.events.send(event);
    }

    fn check_writable(&self) -> ParlorResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ParlorError::BackendUnavailable(
                "simulated write failure".to_string(),
            ));
        }
        Ok(())
    }

    fn store_file(&self, name: &str, bytes: Vec<u8>, mime: &str) -> ParlorResult<StoredFile> {
        let file = StoredFile {
            id: Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            mime_type: mime.to_string(),
            size_original: bytes.len() as u64,
        };
        self.lock()?
            .files
            .insert(file.id.clone(), (file.clone(), bytes));
        Ok(file)
    }
}

#[async_trait]
impl DocumentStore for InMemoryBackend {
    async fn create_document(&self, collection: &str, data: Value) -> ParlorResult<Value> {
        self.calls.push(Call::Create {
            collection: collection.to_string(),
        });
        self.check_writable()?;
        let document = self.insert(collection, data)?;
        self.emit(collection, &document, "create");
        Ok(document)
    }

    async fn get_document(&self, collection: &str, id: &str) -> ParlorResult<Value> {
        self.calls.push(Call::Get {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(ParlorError::BackendUnavailable(
                "simulated read failure".to_string(),
            ));
        }
        let state = self.lock()?;
        state
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d["$id"] == id))
            .cloned()
            .ok_or_else(|| ParlorError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
    }

    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> ParlorResult<DocumentList<Value>> {
        self.calls.push(Call::List {
            collection: collection.to_string(),
        });
        let all = self
            .lock()?
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default();
        let total = all
            .iter()
            .filter(|d| queries.iter().all(|q| q.matches(d)))
            .count() as u64;
        Ok(DocumentList {
            total,
            documents: apply_queries(all, queries),
        })
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> ParlorResult<Value> {
        self.calls.push(Call::Update {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self.check_writable()?;
        let now = self.next_timestamp();
        let updated = {
            let mut state = self.lock()?;
            let document = state
                .collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|d| d["$id"] == id))
                .ok_or_else(|| ParlorError::DocumentNotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            if let (Value::Object(target), Value::Object(patch)) = (&mut *document, data) {
                for (key, value) in patch {
                    if !key.starts_with('$') {
                        target.insert(key, value);
                    }
                }
                target.insert("$updatedAt".into(), json!(now));
            }
            document.clone()
        };
        self.emit(collection, &updated, "update");
        Ok(updated)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> ParlorResult<()> {
        self.calls.push(Call::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self.check_writable()?;
        let removed = {
            let mut state = self.lock()?;
            let docs = state.collections.entry(collection.to_string()).or_default();
            let position = docs.iter().position(|d| d["$id"] == id).ok_or_else(|| {
                ParlorError::DocumentNotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                }
            })?;
            docs.remove(position)
        };
        self.emit(collection, &removed, "delete");
        Ok(())
    }
}

#[async_trait]
impl FileStore for InMemoryBackend {
    async fn upload_file(&self, path: &Path) -> ParlorResult<StoredFile> {
        self.calls.push(Call::UploadFile);
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ParlorError::MediaFileNotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        if self.fail_streamed_uploads.load(Ordering::SeqCst)
            || self.fail_uploads.load(Ordering::SeqCst)
        {
            return Err(ParlorError::UploadFailed(
                "simulated upload failure".to_string(),
            ));
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        let mime = MessageKind::from_path(path).mime_type(path);
        self.store_file(name, bytes, mime)
    }

    async fn upload_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> ParlorResult<StoredFile> {
        self.calls.push(Call::UploadBytes);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(ParlorError::UploadFailed(
                "simulated upload failure".to_string(),
            ));
        }
        self.store_file(file_name, bytes, mime_type)
    }

    fn view_url(&self, file_id: &str) -> String {
        format!(
            "http://localhost/v1/storage/buckets/{}/files/{}/view?project=offline",
            self.bucket_id, file_id
        )
    }

    async fn delete_file(&self, file_id: &str) -> ParlorResult<()> {
        self.calls.push(Call::DeleteFile {
            id: file_id.to_string(),
        });
        if self.fail_file_deletes.load(Ordering::SeqCst) {
            return Err(ParlorError::FileDeleteFailed {
                file_id: file_id.to_string(),
                message: "simulated delete failure".to_string(),
            });
        }
        self.lock()?
            .files
            .remove(file_id)
            .map(|_| ())
            .ok_or_else(|| ParlorError::FileDeleteFailed {
                file_id: file_id.to_string(),
                message: "no such file".to_string(),
            })
    }
}

#[async_trait]
impl RealtimeSource for InMemoryBackend {
    async fn subscribe(&self, subscribed: Vec<String>) -> ParlorResult<Subscription> {
        self.calls.push(Call::Subscribe);
        let mut events = self.events.subscribe();
        let (tx, rx) = mpsc::channel(64);

        let task = tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "In-memory subscriber lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let wanted = event.channels.is_empty()
                    || event
                        .channels
                        .iter()
                        .any(|published| subscribed.iter().any(|s| channels::covers(s, published)));
                if wanted && tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok(Subscription::new(rx, Some(task)))
    }
}
