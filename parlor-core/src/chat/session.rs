use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::audio::AudioSlot;
use super::mention;
use crate::backend::{RealtimeEvent, StoredFile, Subscription};
use crate::context::ServiceContext;
use crate::error::{ParlorError, ParlorResult};
use crate::models::{ChatRoom, Message, MessageKind, NewMessage, User};
use crate::rooms::{self, RoomDeletion};

pub const ROOM_NOT_FOUND: &str = "We couldn't find this chat room";

/// What the composer is doing once the room is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composer {
    Idle,
    Composing,
    Recording,
    Uploading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready(Composer),
}

/// User-facing failure notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// Write-path failure the user must dismiss.
    Blocking { title: String, message: String },
    /// Background failure such as an assistant error.
    Notice { message: String },
}

impl Alert {
    fn blocking(title: &str, error: &ParlorError) -> Self {
        Alert::Blocking {
            title: title.to_string(),
            message: error.to_string(),
        }
    }
}

/// Scroll position relative to the newest message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    pub at_bottom: bool,
    pub unread: usize,
    pub show_jump: bool,
    pending_scroll: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            at_bottom: true,
            unread: 0,
            show_jump: false,
            pending_scroll: false,
        }
    }
}

/// Result of pressing send.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank draft, nothing happened.
    Ignored,
    Sent {
        message: Message,
        /// Prompt to forward when the text mentioned the assistant.
        assistant_prompt: Option<String>,
    },
}

/// Detached request for an assistant reply, safe to run on another task.
#[derive(Clone)]
pub struct AssistantRequest {
    ctx: ServiceContext,
    room_id: String,
    prompt: String,
}

impl AssistantRequest {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Generates the reply and stores it as an assistant message in the room.
    pub async fn run(self) -> ParlorResult<Message> {
        debug!(
            provider = self.ctx.assistant.provider_name(),
            room = %self.room_id,
            "Requesting assistant reply"
        );
        let reply = self
            .ctx
            .assistant
            .generate_reply(&self.prompt, &self.ctx.reply_options)
            .await?;
        let message = self
            .ctx
            .create_message(&NewMessage::assistant(&self.room_id, reply))
            .await?;
        info!(room = %self.room_id, message = %message.id(), "Assistant replied");
        Ok(message)
    }
}

/// Streamed upload first, then the buffered multipart fallback.
pub async fn upload_media(ctx: &ServiceContext, path: &Path) -> ParlorResult<StoredFile> {
    let streamed_error = match ctx.files.upload_file(path).await {
        Ok(file) => return Ok(file),
        Err(e @ ParlorError::MediaFileNotFound(_)) => return Err(e),
        Err(e) => e,
    };
    warn!(path = %path.display(), "Streamed upload failed, retrying buffered: {}", streamed_error);

    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ParlorError::MediaFileNotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    let mime = MessageKind::from_path(path).mime_type(path);
    ctx.files.upload_bytes(file_name, bytes, mime).await
}

/// State machine behind one open chat room.
pub struct ChatRoomSession {
    ctx: ServiceContext,
    room_id: String,
    viewer: User,
    room: Option<ChatRoom>,
    messages: Vec<Message>,
    phase: Phase,
    draft: String,
    viewport: Viewport,
    error: Option<String>,
    alerts: VecDeque<Alert>,
    audio: AudioSlot,
    subscription: Option<Subscription>,
}

impl ChatRoomSession {
    pub fn new(ctx: ServiceContext, room_id: impl Into<String>, viewer: User) -> Self {
        Self {
            ctx,
            room_id: room_id.into(),
            viewer,
            room: None,
            messages: Vec::new(),
            phase: Phase::Loading,
            draft: String::new(),
            viewport: Viewport::default(),
            error: None,
            alerts: VecDeque::new(),
            audio: AudioSlot::default(),
            subscription: None,
        }
    }

    // ---- accessors ----

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn room(&self) -> Option<&ChatRoom> {
        self.room.as_ref()
    }

    pub fn viewer(&self) -> &User {
        &self.viewer
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Inline error shown in place of the conversation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True when the room id did not resolve, as opposed to a failed fetch.
    pub fn is_missing(&self) -> bool {
        self.error.as_deref() == Some(ROOM_NOT_FOUND)
    }

    pub fn audio(&self) -> &AudioSlot {
        &self.audio
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn pop_alert(&mut self) -> Option<Alert> {
        self.alerts.pop_front()
    }

    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    // ---- loading ----

    /// Fetches the room and its latest messages. Failures leave partial state behind.
    pub async fn load(&mut self) {
        self.phase = Phase::Loading;
        self.error = None;

        match self.ctx.get_room(&self.room_id).await {
            Ok(room) => self.room = Some(room),
            Err(e) => {
                error!(room = %self.room_id, "Error fetching chat room: {}", e);
                self.error = Some(match e {
                    ParlorError::DocumentNotFound { .. } => ROOM_NOT_FOUND.to_string(),
                    other => other.to_string(),
                });
            }
        }

        self.refresh_messages().await;
        self.viewport.pending_scroll = true;
        self.phase = Phase::Ready(self.idle_composer());
    }

    /// Re-reads the whole message list. A failed fetch keeps the stale list.
    pub async fn refresh_messages(&mut self) {
        match self.ctx.list_messages(&self.room_id).await {
            Ok(messages) => self.messages = messages,
            Err(e) => error!(room = %self.room_id, "Error fetching messages: {}", e),
        }
    }

    // ---- realtime ----

    pub async fn subscribe(&mut self) -> ParlorResult<()> {
        let channels = self.ctx.room_channels(&self.room_id);
        let subscription = self.ctx.realtime.subscribe(channels).await?;
        self.subscription = Some(subscription);
        debug!(room = %self.room_id, "Subscribed to room updates");
        Ok(())
    }

    /// Drops the live subscription and releases any audio handle.
    pub fn close(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.close();
        }
        self.audio.stop();
    }

    /// Waits for the next event on the live subscription.
    pub async fn next_event(&mut self) -> Option<RealtimeEvent> {
        match self.subscription.as_mut() {
            Some(subscription) => subscription.recv().await,
            None => None,
        }
    }

    /// Handles whatever events are already queued. Returns how many concerned this room.
    pub async fn drain_events(&mut self) -> usize {
        let mut pending = Vec::new();
        if let Some(subscription) = self.subscription.as_mut() {
            while let Some(event) = subscription.try_recv() {
                pending.push(event);
            }
        }
        let mut handled = 0;
        for event in pending {
            if self.handle_event(&event).await {
                handled += 1;
            }
        }
        handled
    }

    /// Refetches on any event about this room and updates the unread affordance.
    pub async fn handle_event(&mut self, event: &RealtimeEvent) -> bool {
        if !event.concerns_room(&self.room_id) {
            return false;
        }
        self.refresh_messages().await;

        match event.sender_id() {
            Some(sender) if sender != self.viewer.id && !self.viewport.at_bottom => {
                self.viewport.unread += 1;
                self.viewport.show_jump = true;
            }
            _ if self.viewport.at_bottom => self.viewport.pending_scroll = true,
            _ => {}
        }
        true
    }

    // ---- viewport ----

    pub fn set_at_bottom(&mut self, at_bottom: bool) {
        self.viewport.at_bottom = at_bottom;
        if at_bottom {
            self.viewport.unread = 0;
            self.viewport.show_jump = false;
        }
    }

    pub fn jump_to_latest(&mut self) {
        self.set_at_bottom(true);
        self.viewport.pending_scroll = true;
    }

    /// True once per scheduled scroll to the newest message.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.viewport.pending_scroll)
    }

    // ---- composer ----

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
        if let Phase::Ready(Composer::Idle | Composer::Composing) = self.phase {
            self.phase = Phase::Ready(self.idle_composer());
        }
    }

    pub fn mention_suggestions(&self) -> Vec<&'static str> {
        mention::suggestions(&self.draft)
    }

    pub fn accept_suggestion(&mut self, handle: &str) {
        let next = mention::apply_suggestion(&self.draft, handle);
        self.set_draft(next);
    }

    /// Sends the draft verbatim. A blank draft is ignored without touching the backend.
    pub async fn send_text(&mut self) -> ParlorResult<SendOutcome> {
        if self.draft.trim().is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        let new_message = NewMessage::text(&self.room_id, &self.viewer, self.draft.clone());
        let message = match self.ctx.create_message(&new_message).await {
            Ok(m) => m,
            Err(e) => {
                error!(room = %self.room_id, "Error sending message: {}", e);
                self.alerts.push_back(Alert::blocking("Error", &e));
                return Err(e);
            }
        };

        let assistant_prompt = mention::mentions_assistant(&self.draft)
            .then(|| mention::strip_assistant_mention(&self.draft));
        self.draft.clear();
        self.phase = Phase::Ready(Composer::Idle);
        self.remember(message.clone());
        self.jump_to_latest();
        self.ctx.touch_room(&self.room_id).await;

        Ok(SendOutcome::Sent {
            message,
            assistant_prompt,
        })
    }

    pub fn assistant_request(&self, prompt: impl Into<String>) -> AssistantRequest {
        AssistantRequest {
            ctx: self.ctx.clone(),
            room_id: self.room_id.clone(),
            prompt: prompt.into(),
        }
    }

    /// Folds a finished assistant reply into the session. Failures never block.
    pub fn apply_assistant_result(&mut self, result: ParlorResult<Message>) {
        match result {
            Ok(message) => {
                self.remember(message);
                if self.viewport.at_bottom {
                    self.viewport.pending_scroll = true;
                }
            }
            Err(e) => {
                warn!(room = %self.room_id, "Assistant reply failed: {}", e);
                self.alerts.push_back(Alert::Notice {
                    message: format!("Assistant unavailable: {}", e),
                });
            }
        }
    }

    /// Sends the draft and, when it mentions the assistant, waits for the reply too.
    pub async fn send_and_reply(&mut self) -> ParlorResult<SendOutcome> {
        let outcome = self.send_text().await?;
        if let SendOutcome::Sent {
            assistant_prompt: Some(prompt),
            ..
        } = &outcome
        {
            let result = self.assistant_request(prompt.clone()).run().await;
            self.apply_assistant_result(result);
        }
        Ok(outcome)
    }

    /// Uploads a local file and posts it as a media message.
    pub async fn send_media(&mut self, path: &Path, kind: MessageKind) -> ParlorResult<Message> {
        let resume = self.idle_composer();
        self.phase = Phase::Ready(Composer::Uploading);

        let file = match upload_media(&self.ctx, path).await {
            Ok(f) => f,
            Err(e) => {
                error!(path = %path.display(), "Error uploading media: {}", e);
                self.alerts.push_back(Alert::blocking("Upload failed", &e));
                self.phase = Phase::Ready(resume);
                return Err(e);
            }
        };

        let url = self.ctx.files.view_url(&file.id);
        let result = self
            .ctx
            .create_message(&NewMessage::media(&self.room_id, &self.viewer, url, kind))
            .await;
        self.phase = Phase::Ready(resume);

        match result {
            Ok(message) => {
                info!(room = %self.room_id, kind = %kind, file = %file.id, "Media sent");
                self.remember(message.clone());
                self.jump_to_latest();
                self.ctx.touch_room(&self.room_id).await;
                Ok(message)
            }
            Err(e) => {
                error!(room = %self.room_id, "Error sending media message: {}", e);
                self.alerts.push_back(Alert::blocking("Error", &e));
                Err(e)
            }
        }
    }

    // ---- audio ----

    pub fn start_recording(&mut self, path: impl Into<PathBuf>) {
        self.audio.start_recording(path.into());
        self.phase = Phase::Ready(Composer::Recording);
    }

    pub fn cancel_recording(&mut self) {
        self.audio.finish_recording();
        self.phase = Phase::Ready(self.idle_composer());
    }

    /// Stops recording and sends the captured file as an audio message.
    pub async fn finish_recording(&mut self) -> ParlorResult<Option<Message>> {
        let Some(path) = self.audio.finish_recording() else {
            return Ok(None);
        };
        self.phase = Phase::Ready(self.idle_composer());
        self.send_media(&path, MessageKind::Audio).await.map(Some)
    }

    /// Starts playback of an audio message, or stops it when it is already playing.
    pub fn toggle_playback(&mut self, message_id: &str) -> bool {
        if self.audio.playing() == Some(message_id) {
            self.audio.stop();
            return false;
        }
        let Some(message) = self
            .messages
            .iter()
            .find(|m| m.id() == message_id && m.kind == MessageKind::Audio)
        else {
            return false;
        };
        let url = message.content.clone();
        self.audio.start_playback(message_id, url);
        if self.phase == Phase::Ready(Composer::Recording) {
            self.phase = Phase::Ready(self.idle_composer());
        }
        true
    }

    // ---- deletion ----

    /// Deletes one of the viewer's messages, cleaning up stored media first.
    pub async fn delete_message(&mut self, message_id: &str) -> ParlorResult<()> {
        let message = match self.messages.iter().find(|m| m.id() == message_id) {
            Some(loaded) => loaded.clone(),
            // Older than the loaded page; look it up directly.
            None => self.ctx.get_message(message_id).await?,
        };
        if message.chat_room_id != self.room_id {
            return Err(ParlorError::DocumentNotFound {
                collection: self.ctx.collections.messages.clone(),
                id: message_id.to_string(),
            });
        }
        if !message.is_from(&self.viewer.id) {
            return Err(ParlorError::NotOwner(message_id.to_string()));
        }

        if let Some(file_id) = message.media_file_id() {
            if let Err(e) = self.ctx.files.delete_file(&file_id).await {
                warn!(file_id = %file_id, "Media cleanup failed: {}", e);
            }
        }

        if let Err(e) = self.ctx.delete_message_document(message_id).await {
            error!(message = %message_id, "Error deleting message: {}", e);
            self.alerts.push_back(Alert::blocking("Error", &e));
            return Err(e);
        }
        if self.audio.playing() == Some(message_id) {
            self.audio.stop();
        }
        self.messages.retain(|m| m.id() != message_id);
        Ok(())
    }

    /// Deletes the room with all of its messages and media.
    pub async fn delete_room(&mut self) -> ParlorResult<RoomDeletion> {
        match rooms::delete_room(&self.ctx, &self.room_id).await {
            Ok(outcome) => {
                self.close();
                self.messages.clear();
                Ok(outcome)
            }
            Err(e) => {
                error!(room = %self.room_id, "Error deleting chat room: {}", e);
                self.alerts.push_back(Alert::blocking("Error", &e));
                Err(e)
            }
        }
    }

    fn idle_composer(&self) -> Composer {
        if self.audio.is_recording() {
            Composer::Recording
        } else if self.draft.is_empty() {
            Composer::Idle
        } else {
            Composer::Composing
        }
    }

    fn remember(&mut self, message: Message) {
        if !self.messages.iter().any(|m| m.id() == message.id()) {
            self.messages.push(message);
        }
    }
}

impl Drop for ChatRoomSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::GeminiClient;
    use crate::backend::InMemoryBackend;
    use crate::config::ParlorConfig;
    use std::sync::Arc;

    fn session() -> (Arc<InMemoryBackend>, ChatRoomSession) {
        let config = ParlorConfig::offline();
        let backend = Arc::new(InMemoryBackend::new("offline", "media"));
        let ctx = ServiceContext::in_memory(
            &config,
            backend.clone(),
            Arc::new(GeminiClient::with_api_key(String::new())),
        );
        let viewer = User::new("user_a").with_name("Ada");
        (backend, ChatRoomSession::new(ctx, "r1", viewer))
    }

    #[test]
    fn test_draft_drives_composer_phase() {
        let (_, mut s) = session();
        s.phase = Phase::Ready(Composer::Idle);
        s.set_draft("hi");
        assert_eq!(s.phase(), Phase::Ready(Composer::Composing));
        s.set_draft("");
        assert_eq!(s.phase(), Phase::Ready(Composer::Idle));
    }

    #[test]
    fn test_viewport_jump_clears_unread() {
        let (_, mut s) = session();
        s.set_at_bottom(false);
        s.viewport.unread = 3;
        s.viewport.show_jump = true;
        s.jump_to_latest();
        assert_eq!(s.viewport().unread, 0);
        assert!(!s.viewport().show_jump);
        assert!(s.take_scroll_request());
        assert!(!s.take_scroll_request());
    }

    #[tokio::test]
    async fn test_load_missing_room_sets_inline_error() {
        let (_, mut s) = session();
        s.load().await;
        assert_eq!(s.error(), Some(ROOM_NOT_FOUND));
        assert!(matches!(s.phase(), Phase::Ready(_)));
    }

    #[tokio::test]
    async fn test_recording_toggle() {
        let (_, mut s) = session();
        s.phase = Phase::Ready(Composer::Idle);
        s.start_recording("/tmp/voice.m4a");
        assert_eq!(s.phase(), Phase::Ready(Composer::Recording));
        s.cancel_recording();
        assert_eq!(s.phase(), Phase::Ready(Composer::Idle));
        assert!(s.finish_recording().await.unwrap().is_none());
    }
}
