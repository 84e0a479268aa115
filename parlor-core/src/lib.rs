#![allow(
    clippy::needless_borrows_for_generic_args,
    clippy::derivable_impls,
    clippy::type_complexity,
    clippy::len_zero,
    dead_code,
    unused_imports,
    unused_variables,
    unused_mut
)]

pub mod assistant;
pub mod backend;
pub mod chat;
pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod models;
pub mod rooms;

pub use assistant::{build_prompt, AssistantClient, GeminiClient, ReplyOptions};
pub use backend::{
    AppwriteClient, AppwriteRealtime, CallLog, DocumentStore, FileStore, InMemoryBackend, Query,
    RealtimeEvent, RealtimeSource, StoredFile, Subscription,
};
pub use chat::{
    Alert, AssistantRequest, AudioSlot, ChatRoomSession, Composer, Phase, SendOutcome, Viewport,
};
pub use config::{
    ensure_data_dir, get_config_dir, get_config_paths, get_data_dir, AssistantConfig,
    BackendConfig, ConfigLoadError, IdentityConfig, LoggingConfig, ParlorConfig, TuiConfig,
};
pub use context::{Collections, ServiceContext};
pub use error::{CliErrorDisplay, ParlorError, ParlorResult};
pub use identity::{
    AuthState, ClerkClient, FileTokenCache, Gate, IdentityProvider, LocalIdentity,
    MemoryTokenCache, Session, SsoChallenge, SsoStrategy, TokenCache,
};
pub use models::{ChatRoom, Message, MessageKind, NewChatRoom, NewMessage, User};
pub use rooms::{delete_room, RoomDeletion, RoomDirectory, RoomForm};
