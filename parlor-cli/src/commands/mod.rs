pub mod ask;
pub mod auth;
pub mod config;
pub mod messages;
pub mod rooms;
pub mod watch;

pub use ask::handle_ask_command;
pub use auth::{handle_auth_command, AuthCommand};
pub use config::{handle_config_command, ConfigCommand};
pub use messages::{handle_messages_command, MessagesCommand};
pub use rooms::{handle_rooms_command, RoomsCommand};
pub use watch::handle_watch_command;
