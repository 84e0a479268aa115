use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{DocumentMeta, User};

/// Fixed author id of assistant replies.
pub const ASSISTANT_SENDER_ID: &str = "assistant";
pub const ASSISTANT_SENDER_NAME: &str = "Assistant";

/// How a message's `content` is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Audio,
    File,
}

impl MessageKind {
    /// Media kinds store a storage URL in `content`.
    pub fn is_media(&self) -> bool {
        !matches!(self, MessageKind::Text)
    }

    /// Guesses a kind from a local file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "heic" | "bmp" => MessageKind::Image,
            "m4a" | "mp3" | "wav" | "aac" | "ogg" | "opus" | "caf" => MessageKind::Audio,
            _ => MessageKind::File,
        }
    }

    pub fn mime_type(&self, path: &Path) -> &'static str {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "heic" => "image/heic",
            "m4a" => "audio/mp4",
            "mp3" => "audio/mpeg",
            "wav" => "audio/wav",
            "aac" => "audio/aac",
            "ogg" | "opus" => "audio/ogg",
            _ => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Text => write!(f, "text"),
            MessageKind::Image => write!(f, "image"),
            MessageKind::Audio => write!(f, "audio"),
            MessageKind::File => write!(f, "file"),
        }
    }
}

impl std::str::FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(MessageKind::Text),
            "image" => Ok(MessageKind::Image),
            "audio" => Ok(MessageKind::Audio),
            "file" => Ok(MessageKind::File),
            other => Err(format!("unknown message type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub sender_photo: String,
    #[serde(default)]
    pub chat_room_id: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_kind")]
    pub kind: MessageKind,
}

/// Missing or null reads as text; an unrecognised type reads as a generic file.
fn lenient_kind<'de, D>(deserializer: D) -> Result<MessageKind, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(match raw.as_deref().map(str::trim) {
        None | Some("") => MessageKind::Text,
        Some(other) => other.parse().unwrap_or(MessageKind::File),
    })
}

impl Message {
    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn is_from(&self, user_id: &str) -> bool {
        self.sender_id == user_id
    }

    pub fn is_assistant(&self) -> bool {
        self.sender_id == ASSISTANT_SENDER_ID
    }

    /// Stored file id behind a media message, if its content is a storage URL.
    pub fn media_file_id(&self) -> Option<String> {
        if !self.kind.is_media() || self.content.trim().is_empty() {
            return None;
        }
        file_id_from_url(&self.content)
    }
}

/// Extracts `{file}` from `.../storage/buckets/{bucket}/files/{file}/view`.
pub fn file_id_from_url(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    let mut segments = parsed.path_segments()?;
    segments
        .by_ref()
        .find(|segment| *segment == "files")?;
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Fields written when a message is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub content: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_photo: String,
    pub chat_room_id: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

impl NewMessage {
    pub fn text(room_id: &str, sender: &User, content: impl Into<String>) -> Self {
        Self::from_user(room_id, sender, content.into(), MessageKind::Text)
    }

    pub fn media(room_id: &str, sender: &User, url: impl Into<String>, kind: MessageKind) -> Self {
        Self::from_user(room_id, sender, url.into(), kind)
    }

    pub fn assistant(room_id: &str, reply: impl Into<String>) -> Self {
        Self {
            content: reply.into(),
            sender_id: ASSISTANT_SENDER_ID.to_string(),
            sender_name: ASSISTANT_SENDER_NAME.to_string(),
            sender_photo: String::new(),
            chat_room_id: room_id.to_string(),
            kind: MessageKind::Text,
        }
    }

    fn from_user(room_id: &str, sender: &User, content: String, kind: MessageKind) -> Self {
        Self {
            content,
            sender_id: sender.id.clone(),
            sender_name: sender.display_name().to_string(),
            sender_photo: sender.avatar_url().to_string(),
            chat_room_id: room_id.to_string(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&MessageKind::Image).unwrap(),
            "\"image\""
        );
        assert_eq!("AUDIO".parse::<MessageKind>().unwrap(), MessageKind::Audio);
        assert!("video".parse::<MessageKind>().is_err());
    }

    #[test]
    fn test_missing_type_reads_as_text() {
        let raw = serde_json::json!({
            "$id": "m1",
            "$createdAt": "2025-08-26T09:12:44.123+00:00",
            "$updatedAt": "2025-08-26T09:12:44.123+00:00",
            "content": "hi",
            "senderId": "user_a",
            "senderName": "A",
            "chatRoomId": "r1"
        });
        let msg: Message = serde_json::from_value(raw).unwrap();
        assert_eq!(msg.kind, MessageKind::Text);
        assert_eq!(msg.sender_photo, "");
        assert!(msg.is_from("user_a"));
    }

    #[test]
    fn test_kind_from_path() {
        assert_eq!(MessageKind::from_path(Path::new("a.JPG")), MessageKind::Image);
        assert_eq!(MessageKind::from_path(Path::new("note.m4a")), MessageKind::Audio);
        assert_eq!(MessageKind::from_path(Path::new("doc.pdf")), MessageKind::File);
        assert_eq!(
            MessageKind::Image.mime_type(Path::new("a.png")),
            "image/png"
        );
    }

    #[test]
    fn test_file_id_from_url() {
        let url = "https://cloud.appwrite.io/v1/storage/buckets/media/files/abc123/view?project=p";
        assert_eq!(file_id_from_url(url).as_deref(), Some("abc123"));
        assert_eq!(file_id_from_url("not a url"), None);
        assert_eq!(file_id_from_url("https://example.com/a/b"), None);
    }

    #[test]
    fn test_new_message_uses_identity() {
        let user = User::new("user_a").with_name("Ada").with_image("https://img/a.png");
        let msg = NewMessage::text("r1", &user, "hello");
        assert_eq!(msg.sender_name, "Ada");
        assert_eq!(msg.sender_photo, "https://img/a.png");

        let anon = NewMessage::text("r1", &User::new("u2"), "hey");
        assert_eq!(anon.sender_name, "Anonymous");
        assert_eq!(anon.sender_photo, "");

        let reply = NewMessage::assistant("r1", "It is noon.");
        assert_eq!(reply.sender_id, ASSISTANT_SENDER_ID);
        let wire = serde_json::to_value(&reply).unwrap();
        assert_eq!(wire["type"], "text");
        assert_eq!(wire["chatRoomId"], "r1");
    }
}
