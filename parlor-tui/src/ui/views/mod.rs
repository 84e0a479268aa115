mod chat;
mod help;
mod new_room;
mod profile;
mod rooms;
mod settings;
mod sign_in;

pub use chat::{wrap_text, ChatView};
pub use help::HelpView;
pub use new_room::NewRoomView;
pub use profile::ProfileView;
pub use rooms::RoomsView;
pub use settings::RoomSettingsView;
pub use sign_in::SignInView;
