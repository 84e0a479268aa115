//! One open chat room: message list, composer, realtime updates and media.
//!
//! [`ChatRoomSession`] owns the screen state and performs every backend call
//! the chat screen needs. Assistant replies run detached through
//! [`AssistantRequest`] so a slow model never blocks the composer.

pub mod audio;
pub mod mention;
mod session;

pub use audio::{AudioHandle, AudioSlot};
pub use mention::{apply_suggestion, mentions_assistant, strip_assistant_mention, suggestions};
pub use session::{
    upload_media, Alert, AssistantRequest, ChatRoomSession, Composer, Phase, SendOutcome,
    Viewport, ROOM_NOT_FOUND,
};
