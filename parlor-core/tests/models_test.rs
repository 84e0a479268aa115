use parlor_core::models::{
    file_id_from_url, ChatRoom, Message, MessageKind, NewChatRoom, NewMessage, User,
    ASSISTANT_SENDER_ID, DESCRIPTION_MAX_CHARS,
};
use serde_json::json;
use std::path::Path;

mod message_tests {
    use super::*;

    #[test]
    fn test_decodes_stored_document() {
        let message: Message = serde_json::from_value(json!({
            "$id": "m1",
            "$createdAt": "2025-08-26T09:12:44.123+00:00",
            "$updatedAt": "2025-08-26T09:12:44.123+00:00",
            "$permissions": ["read(\"any\")"],
            "$databaseId": "chat",
            "$collectionId": "messages",
            "content": "https://cloud.appwrite.io/v1/storage/buckets/media/files/f1/view?project=p",
            "senderId": "user_a",
            "senderName": "Ada",
            "senderPhoto": "",
            "chatRoomId": "r1",
            "type": "image"
        }))
        .unwrap();

        assert_eq!(message.id(), "m1");
        assert_eq!(message.kind, MessageKind::Image);
        assert_eq!(message.media_file_id().as_deref(), Some("f1"));
        assert!(message.is_from("user_a"));
        assert!(!message.is_assistant());
    }

    #[test]
    fn test_missing_type_defaults_to_text() {
        let message: Message = serde_json::from_value(json!({
            "$id": "m2",
            "$createdAt": "2025-08-26T09:12:44.123+00:00",
            "$updatedAt": "2025-08-26T09:12:44.123+00:00",
            "content": "hello",
            "senderId": "user_a",
            "chatRoomId": "r1"
        }))
        .unwrap();
        assert_eq!(message.kind, MessageKind::Text);
        assert_eq!(message.sender_name, "");
        assert!(message.media_file_id().is_none());
    }

    fn stored(kind: serde_json::Value) -> serde_json::Value {
        json!({
            "$id": "m3",
            "$createdAt": "2025-08-26T09:12:44.123+00:00",
            "$updatedAt": "2025-08-26T09:12:44.123+00:00",
            "content": "https://cloud.appwrite.io/v1/storage/buckets/media/files/f9/view?project=p",
            "senderId": "user_a",
            "chatRoomId": "r1",
            "type": kind
        })
    }

    #[test]
    fn test_null_type_reads_as_text() {
        let message: Message = serde_json::from_value(stored(json!(null))).unwrap();
        assert_eq!(message.kind, MessageKind::Text);
        assert!(message.media_file_id().is_none());
    }

    #[test]
    fn test_unknown_type_reads_as_file() {
        let message: Message = serde_json::from_value(stored(json!("video"))).unwrap();
        assert_eq!(message.kind, MessageKind::File);
        assert_eq!(message.media_file_id().as_deref(), Some("f9"));
    }

    #[test]
    fn test_missing_sender_still_decodes() {
        let message: Message = serde_json::from_value(json!({
            "$id": "m4",
            "$createdAt": "2025-08-26T09:12:44.123+00:00",
            "$updatedAt": "2025-08-26T09:12:44.123+00:00",
            "content": "orphan",
            "chatRoomId": "r1"
        }))
        .unwrap();
        assert_eq!(message.sender_id, "");
        assert!(!message.is_assistant());
    }

    #[test]
    fn test_new_message_wire_shape() {
        let user = User::new("user_a").with_image("https://img/a.png");
        let value = serde_json::to_value(NewMessage::text("r1", &user, "hi")).unwrap();
        assert_eq!(
            value,
            json!({
                "content": "hi",
                "senderId": "user_a",
                "senderName": "Anonymous",
                "senderPhoto": "https://img/a.png",
                "chatRoomId": "r1",
                "type": "text"
            })
        );

        let reply = NewMessage::assistant("r1", "It is noon.");
        assert_eq!(reply.sender_id, ASSISTANT_SENDER_ID);
        assert_eq!(reply.kind, MessageKind::Text);
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(MessageKind::from_path(Path::new("a.JPG")), MessageKind::Image);
        assert_eq!(MessageKind::from_path(Path::new("v.m4a")), MessageKind::Audio);
        assert_eq!(MessageKind::from_path(Path::new("notes.pdf")), MessageKind::File);
        assert_eq!("Audio".parse::<MessageKind>().unwrap(), MessageKind::Audio);
        assert!("video".parse::<MessageKind>().is_err());
    }

    #[test]
    fn test_file_id_from_url() {
        assert_eq!(
            file_id_from_url("http://localhost/v1/storage/buckets/b/files/abc/view").as_deref(),
            Some("abc")
        );
        assert!(file_id_from_url("not a url").is_none());
        assert!(file_id_from_url("https://example.com/images/cat.png").is_none());
    }
}

mod room_tests {
    use super::*;

    #[test]
    fn test_room_with_empty_description() {
        let room: ChatRoom = serde_json::from_value(json!({
            "$id": "r1",
            "$createdAt": "2025-08-26T09:00:00.000+00:00",
            "$updatedAt": "2025-08-26T09:00:00.000+00:00",
            "title": "General"
        }))
        .unwrap();
        assert_eq!(room.id(), "r1");
        assert_eq!(room.description, "");
    }

    #[test]
    fn test_new_room_caps_description() {
        let room = NewChatRoom::new("General", "d".repeat(DESCRIPTION_MAX_CHARS + 20)).unwrap();
        assert_eq!(room.description.chars().count(), DESCRIPTION_MAX_CHARS);
    }
}

mod user_tests {
    use super::*;

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(User::new("u").display_name(), "Anonymous");
        assert_eq!(User::new("u").with_name(" ").display_name(), "Anonymous");
        assert_eq!(User::new("u").with_name("Ada").display_name(), "Ada");
        assert_eq!(User::new("u").avatar_url(), "");
    }
}
