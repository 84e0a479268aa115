mod dialog;
mod footer;
mod header;
mod toast;

pub use dialog::{ConfirmDialog, DialogButton, DialogKind, DialogResult, DialogState};
pub use footer::Footer;
pub use header::Header;
pub use toast::{ellipsize, Toast, ToastLevel, ToastManager};
