mod document;
mod message;
mod room;
mod user;

pub use document::{DocumentList, DocumentMeta};
pub use message::{
    file_id_from_url, Message, MessageKind, NewMessage, ASSISTANT_SENDER_ID,
    ASSISTANT_SENDER_NAME,
};
pub use room::{ChatRoom, NewChatRoom, DESCRIPTION_MAX_CHARS};
pub use user::User;
