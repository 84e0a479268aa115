use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use parlor_core::{
    Alert, AuthState, ChatRoomSession, Message, MessageKind, ParlorConfig, ParlorError,
    ParlorResult, RoomDirectory, RoomForm, SendOutcome, SsoChallenge, SsoStrategy,
};
use ratatui::{backend::Backend, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::services::Services;
use crate::theme::{Theme, ThemeManager, ThemeStore};
use crate::ui::layout::MainLayout;
use crate::ui::widgets::{ConfirmDialog, DialogResult, DialogState, ToastManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    SignIn,
    Rooms,
    NewRoom,
    Chat,
    RoomSettings,
    Profile,
    Help,
}

impl View {
    /// Views reachable with Tab once signed in.
    pub fn tabs() -> &'static [View] {
        &[View::Rooms, View::Profile, View::Help]
    }

    pub fn name(&self) -> &'static str {
        match self {
            View::SignIn => "Sign In",
            View::Rooms => "Rooms",
            View::NewRoom => "New Room",
            View::Chat => "Chat",
            View::RoomSettings => "Room Settings",
            View::Profile => "Profile",
            View::Help => "Help",
        }
    }

    /// Where Esc leads.
    pub fn parent(&self) -> Option<View> {
        match self {
            View::SignIn | View::Rooms => None,
            View::NewRoom | View::Chat | View::Profile | View::Help => Some(View::Rooms),
            View::RoomSettings => Some(View::Chat),
        }
    }

    /// Views where printable keys are typed into a field.
    pub fn takes_text(&self) -> bool {
        matches!(self, View::NewRoom | View::Chat)
    }
}

/// What to run once the open confirmation dialog is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    DeleteMessage(String),
    DeleteRoom,
    SignOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInStage {
    ChooseMethod,
    AwaitingBrowser,
}

pub const SIGN_IN_METHODS: &[SsoStrategy] = &[SsoStrategy::OauthGoogle, SsoStrategy::Passkey];

#[derive(Debug)]
pub struct SignInState {
    pub stage: SignInStage,
    pub selected: usize,
    pub challenge: Option<SsoChallenge>,
    pub last_error: Option<String>,
}

impl Default for SignInState {
    fn default() -> Self {
        Self {
            stage: SignInStage::ChooseMethod,
            selected: 0,
            challenge: None,
            last_error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPurpose {
    Attach,
    Record,
}

/// Single-line prompt for a local file path.
#[derive(Debug, Clone)]
pub struct PathPrompt {
    pub purpose: PathPurpose,
    pub input: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
}

#[derive(Debug, Default)]
pub struct ChatViewState {
    /// `None` follows the newest message.
    pub selected: Option<usize>,
}

type ReplyResult = (String, ParlorResult<Message>);

pub struct App {
    pub should_quit: bool,
    pub current_view: View,
    help_return: View,
    pub theme_manager: ThemeManager,
    theme_store: ThemeStore,
    pub services: Services,
    pub auth: AuthState,
    pub sign_in: SignInState,
    pub directory: RoomDirectory,
    pub selected_room: usize,
    pub form: RoomForm,
    pub form_field: FormField,
    pub session: Option<ChatRoomSession>,
    pub chat: ChatViewState,
    pub path_prompt: Option<PathPrompt>,
    pub toast_manager: ToastManager,
    pub dialog_state: DialogState,
    pending: Option<PendingAction>,
    replies_tx: mpsc::UnboundedSender<ReplyResult>,
    replies_rx: mpsc::UnboundedReceiver<ReplyResult>,
    pub tick_rate: Duration,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(services: Services, config: &ParlorConfig, theme_store: ThemeStore) -> Self {
        let theme_manager = theme_store.theme_manager(&config.tui.theme);
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();

        Self {
            should_quit: false,
            current_view: View::SignIn,
            help_return: View::Rooms,
            theme_manager,
            theme_store,
            services,
            auth: AuthState::default(),
            sign_in: SignInState::default(),
            directory: RoomDirectory::new(),
            selected_room: 0,
            form: RoomForm::new(),
            form_field: FormField::Title,
            session: None,
            chat: ChatViewState::default(),
            path_prompt: None,
            toast_manager: ToastManager::new(),
            dialog_state: DialogState::new(),
            pending: None,
            replies_tx,
            replies_rx,
            tick_rate: Duration::from_millis(config.tui.tick_rate_ms.max(16)),
            status_message: None,
        }
    }

    pub fn current_theme(&self) -> &Theme {
        self.theme_manager.current_theme()
    }

    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        self.restore_session().await;

        loop {
            self.toast_manager.cleanup();
            terminal.draw(|frame| MainLayout::render(frame, self))?;

            if event::poll(self.tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key).await;
                    }
                }
            }

            self.tick().await;

            if self.should_quit {
                break;
            }
        }

        if let Some(mut session) = self.session.take() {
            session.close();
        }
        Ok(())
    }

    /// Skips the sign-in screen when the provider still has a session.
    pub async fn restore_session(&mut self) {
        match self.services.identity.current_session().await {
            Ok(Some(session)) => {
                info!(user = %session.user.id, "Restored session");
                self.auth = AuthState::signed_in(session);
                self.enter_main().await;
            }
            Ok(None) => debug!("No stored session"),
            Err(e) => warn!("Could not restore session: {}", e),
        }
    }

    /// Folds realtime events and finished assistant replies into the open room.
    pub async fn tick(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.drain_events().await;
        }

        while let Ok((room_id, result)) = self.replies_rx.try_recv() {
            match self.session.as_mut() {
                Some(session) if session.room_id() == room_id => {
                    session.apply_assistant_result(result);
                }
                _ => {
                    if let Err(e) = result {
                        self.toast_manager
                            .warning(format!("Assistant unavailable: {}", e));
                    }
                }
            }
        }

        self.sync_chat_viewport();
        self.surface_alerts();
    }

    fn sync_chat_viewport(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.take_scroll_request() {
            self.chat.selected = None;
        }
        let len = session.messages().len();
        if let Some(selected) = self.chat.selected {
            if selected >= len {
                self.chat.selected = len.checked_sub(1);
            }
        }
    }

    /// Blocking alerts open a dialog, notices become toasts.
    fn surface_alerts(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        while let Some(alert) = session.pop_alert() {
            match alert {
                Alert::Blocking { title, message } if !self.dialog_state.is_open() => {
                    self.pending = None;
                    self.dialog_state.show(ConfirmDialog::alert(title, message));
                }
                Alert::Blocking { title, message } => {
                    self.toast_manager.error(format!("{}: {}", title, message));
                }
                Alert::Notice { message } => self.toast_manager.warning(message),
            }
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.dialog_state.is_open() {
            self.handle_dialog_key(key.code);
            if !self.dialog_state.is_open() {
                self.resolve_dialog().await;
            }
        } else if self.path_prompt.is_some() {
            self.handle_path_prompt_key(key.code).await;
        } else {
            match self.current_view {
                View::SignIn => self.handle_sign_in_key(key.code).await,
                View::Rooms => self.handle_rooms_key(key.code).await,
                View::NewRoom => self.handle_new_room_key(key.code).await,
                View::Chat => self.handle_chat_key(key.code, ctrl).await,
                View::RoomSettings => self.handle_settings_key(key.code),
                View::Profile => self.handle_profile_key(key.code),
                View::Help => self.handle_help_key(key.code),
            }
        }

        self.surface_alerts();
    }

    /// Keys shared by every view that does not take text.
    fn handle_global_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('t') => self.toggle_theme(),
            KeyCode::Char('?') if self.auth.is_signed_in() => self.open_help(),
            KeyCode::Tab if self.auth.is_signed_in() => self.cycle_tab(1),
            KeyCode::BackTab if self.auth.is_signed_in() => self.cycle_tab(-1),
            _ => return false,
        }
        true
    }

    fn cycle_tab(&mut self, step: isize) {
        let tabs = View::tabs();
        let current = tabs
            .iter()
            .position(|v| *v == self.current_view)
            .unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(tabs.len() as isize) as usize;
        self.current_view = tabs[next];
    }

    fn open_help(&mut self) {
        if self.current_view != View::Help {
            self.help_return = self.current_view;
            self.current_view = View::Help;
        }
    }

    fn toggle_theme(&mut self) {
        self.theme_manager.cycle_theme();
        let theme = self.theme_manager.current_theme();
        let (slug, name) = (theme.slug(), theme.name());
        if let Err(e) = self.theme_store.save(slug) {
            warn!("Could not save theme preference: {}", e);
        }
        self.status_message = Some(format!("Theme: {}", name));
    }

    // ---- sign in ----

    async fn handle_sign_in_key(&mut self, key: KeyCode) {
        if self.handle_global_key(key) {
            return;
        }
        match (self.sign_in.stage, key) {
            (SignInStage::ChooseMethod, KeyCode::Char('j') | KeyCode::Down) => {
                self.sign_in.selected = (self.sign_in.selected + 1).min(SIGN_IN_METHODS.len() - 1);
            }
            (SignInStage::ChooseMethod, KeyCode::Char('k') | KeyCode::Up) => {
                self.sign_in.selected = self.sign_in.selected.saturating_sub(1);
            }
            (SignInStage::ChooseMethod, KeyCode::Enter) => self.begin_sign_in().await,
            (SignInStage::AwaitingBrowser, KeyCode::Enter) => self.complete_sign_in().await,
            (SignInStage::AwaitingBrowser, KeyCode::Esc) => {
                self.sign_in = SignInState::default();
            }
            _ => {}
        }
    }

    async fn begin_sign_in(&mut self) {
        let strategy = SIGN_IN_METHODS[self.sign_in.selected];
        match self.services.identity.begin_sign_in(strategy).await {
            Ok(challenge) => {
                self.sign_in.last_error = None;
                self.sign_in.challenge = Some(challenge);
                self.sign_in.stage = SignInStage::AwaitingBrowser;
                if self.services.is_offline() {
                    self.complete_sign_in().await;
                }
            }
            Err(e) => self.record_sign_in_failure(e),
        }
    }

    async fn complete_sign_in(&mut self) {
        let Some(challenge) = self.sign_in.challenge.clone() else {
            self.sign_in.stage = SignInStage::ChooseMethod;
            return;
        };
        match self.services.identity.complete_sign_in(&challenge).await {
            Ok(session) => {
                self.auth.apply(Ok(session));
                self.sign_in = SignInState::default();
                self.enter_main().await;
            }
            // Still waiting on the browser; keep the challenge for another try.
            Err(ParlorError::SignInIncomplete(status)) => {
                self.status_message = Some(format!("Sign-in still {}", status));
            }
            Err(e) => {
                self.sign_in.stage = SignInStage::ChooseMethod;
                self.sign_in.challenge = None;
                self.record_sign_in_failure(e);
            }
        }
    }

    fn record_sign_in_failure(&mut self, error: ParlorError) {
        self.sign_in.last_error = Some(error.to_string());
        self.auth.apply(Err(error));
    }

    async fn enter_main(&mut self) {
        self.current_view = View::Rooms;
        self.selected_room = 0;
        self.directory.refresh(&self.services.ctx).await;
        if let Some(user) = self.auth.user() {
            self.toast_manager
                .success(format!("Signed in as {}", user.display_name()));
        }
    }

    // ---- rooms ----

    async fn handle_rooms_key(&mut self, key: KeyCode) {
        if self.handle_global_key(key) {
            return;
        }
        let count = self.directory.rooms().len();
        match key {
            KeyCode::Char('j') | KeyCode::Down if count > 0 => {
                self.selected_room = (self.selected_room + 1).min(count - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_room = self.selected_room.saturating_sub(1);
            }
            KeyCode::Char('g') => self.selected_room = 0,
            KeyCode::Char('G') => self.selected_room = count.saturating_sub(1),
            KeyCode::Char('n') => {
                self.form = RoomForm::new();
                self.form_field = FormField::Title;
                self.current_view = View::NewRoom;
            }
            KeyCode::Char('r') => self.refresh_rooms().await,
            KeyCode::Char('p') => self.current_view = View::Profile,
            KeyCode::Enter => {
                if let Some(room) = self.directory.rooms().get(self.selected_room) {
                    let room_id = room.id().to_string();
                    self.open_room(&room_id).await;
                }
            }
            _ => {}
        }
    }

    pub async fn refresh_rooms(&mut self) {
        self.directory.refresh(&self.services.ctx).await;
        let count = self.directory.rooms().len();
        self.selected_room = self.selected_room.min(count.saturating_sub(1));
        match self.directory.last_error() {
            Some(error) => self.status_message = Some(format!("Refresh failed: {}", error)),
            None => self.status_message = Some(format!("{} rooms", count)),
        }
    }

    pub async fn open_room(&mut self, room_id: &str) {
        let Some(viewer) = self.auth.user().cloned() else {
            return;
        };
        if let Some(mut previous) = self.session.take() {
            previous.close();
        }

        let mut session = ChatRoomSession::new(self.services.ctx.clone(), room_id, viewer);
        session.load().await;
        if !session.is_missing() {
            if let Err(e) = session.subscribe().await {
                warn!(room = %room_id, "Realtime subscription failed: {}", e);
                self.toast_manager.warning("Live updates unavailable");
            }
        }

        self.session = Some(session);
        self.chat = ChatViewState::default();
        self.current_view = View::Chat;
    }

    fn leave_room(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        self.chat = ChatViewState::default();
        self.current_view = View::Rooms;
    }

    // ---- new room ----

    async fn handle_new_room_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.current_view = View::Rooms,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
                self.form_field = match self.form_field {
                    FormField::Title => FormField::Description,
                    FormField::Description => FormField::Title,
                };
            }
            KeyCode::Backspace => match self.form_field {
                FormField::Title => {
                    self.form.title.pop();
                }
                FormField::Description => {
                    let mut description = self.form.description().to_string();
                    description.pop();
                    self.form.set_description(description);
                }
            },
            KeyCode::Enter => self.submit_room().await,
            KeyCode::Char(c) => match self.form_field {
                FormField::Title => self.form.title.push(c),
                FormField::Description => self.form.push_description(c),
            },
            _ => {}
        }
    }

    async fn submit_room(&mut self) {
        if !self.form.can_submit() {
            self.status_message = Some("A room needs a title".to_string());
            return;
        }
        match self.form.submit(&self.services.ctx).await {
            Ok(room) => {
                self.toast_manager
                    .success(format!("Created room {}", room.title));
                self.directory.refresh(&self.services.ctx).await;
                self.selected_room = self
                    .directory
                    .rooms()
                    .iter()
                    .position(|r| r.id() == room.id())
                    .unwrap_or(0);
                self.current_view = View::Rooms;
            }
            Err(e) => {
                self.dialog_state
                    .show(ConfirmDialog::alert("Error", e.to_string()));
            }
        }
    }

    // ---- chat ----

    async fn handle_chat_key(&mut self, key: KeyCode, ctrl: bool) {
        let Some(session) = self.session.as_mut() else {
            self.current_view = View::Rooms;
            return;
        };

        if ctrl {
            match key {
                KeyCode::Char('d') => self.confirm_delete_selected(),
                KeyCode::Char('o') => {
                    self.path_prompt = Some(PathPrompt {
                        purpose: PathPurpose::Attach,
                        input: String::new(),
                    });
                }
                KeyCode::Char('r') if session.audio().is_recording() => {
                    match session.finish_recording().await {
                        Ok(Some(_)) => self.toast_manager.success("Voice message sent"),
                        Ok(None) => {}
                        Err(e) => debug!("Voice message not sent: {}", e),
                    }
                }
                KeyCode::Char('r') => {
                    self.path_prompt = Some(PathPrompt {
                        purpose: PathPurpose::Record,
                        input: String::new(),
                    });
                }
                KeyCode::Char('p') => self.toggle_selected_playback(),
                KeyCode::Char('s') => self.current_view = View::RoomSettings,
                _ => {}
            }
            return;
        }

        match key {
            KeyCode::Esc if session.audio().is_recording() => {
                session.cancel_recording();
                self.toast_manager.info("Recording discarded");
            }
            KeyCode::Esc => self.leave_room(),
            KeyCode::Enter => self.send_draft().await,
            KeyCode::Tab => {
                if let Some(handle) = session.mention_suggestions().first().copied() {
                    session.accept_suggestion(handle);
                }
            }
            KeyCode::Backspace => {
                let mut draft = session.draft().to_string();
                draft.pop();
                session.set_draft(draft);
            }
            KeyCode::Up => self.move_chat_selection(-1),
            KeyCode::Down => self.move_chat_selection(1),
            KeyCode::End => {
                session.jump_to_latest();
                self.chat.selected = None;
            }
            KeyCode::Char(c) => {
                let mut draft = session.draft().to_string();
                draft.push(c);
                session.set_draft(draft);
            }
            _ => {}
        }
    }

    async fn send_draft(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.send_text().await {
            Ok(SendOutcome::Sent {
                assistant_prompt, ..
            }) => {
                self.chat.selected = None;
                if let Some(prompt) = assistant_prompt {
                    let request = session.assistant_request(prompt);
                    let room_id = session.room_id().to_string();
                    let tx = self.replies_tx.clone();
                    tokio::spawn(async move {
                        let result = request.run().await;
                        let _ = tx.send((room_id, result));
                    });
                    self.status_message = Some("Assistant is thinking…".to_string());
                }
            }
            Ok(SendOutcome::Ignored) => {}
            // Already queued as a blocking alert on the session.
            Err(e) => debug!("Send failed: {}", e),
        }
    }

    fn move_chat_selection(&mut self, step: isize) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let len = session.messages().len();
        if len == 0 {
            return;
        }
        let last = len - 1;
        let next = match (self.chat.selected, step) {
            (None, s) if s < 0 => last,
            (None, _) => return,
            (Some(i), s) if s < 0 => i.saturating_sub(1),
            (Some(i), _) => (i + 1).min(last),
        };
        self.chat.selected = Some(next);
        session.set_at_bottom(next == last);
    }

    pub fn selected_message(&self) -> Option<&Message> {
        let session = self.session.as_ref()?;
        let messages = session.messages();
        match self.chat.selected {
            Some(i) => messages.get(i),
            None => messages.last(),
        }
    }

    fn confirm_delete_selected(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some((message_id, own)) = self
            .selected_message()
            .map(|m| (m.id().to_string(), m.is_from(&session.viewer().id)))
        else {
            return;
        };
        if !own {
            self.toast_manager
                .warning("You can only delete your own messages");
            return;
        }
        self.pending = Some(PendingAction::DeleteMessage(message_id));
        self.dialog_state.show(ConfirmDialog::danger(
            "Delete message",
            "Delete this message? This cannot be undone.",
        ));
    }

    fn toggle_selected_playback(&mut self) {
        let Some(message) = self.selected_message() else {
            return;
        };
        if message.kind != MessageKind::Audio {
            self.status_message = Some("Select an audio message to play".to_string());
            return;
        }
        let message_id = message.id().to_string();
        if let Some(session) = self.session.as_mut() {
            if session.toggle_playback(&message_id) {
                self.status_message = Some("Playing audio".to_string());
            } else {
                self.status_message = Some("Playback stopped".to_string());
            }
        }
    }

    async fn handle_path_prompt_key(&mut self, key: KeyCode) {
        let Some(prompt) = self.path_prompt.as_mut() else {
            return;
        };
        match key {
            KeyCode::Esc => self.path_prompt = None,
            KeyCode::Backspace => {
                prompt.input.pop();
            }
            KeyCode::Char(c) => prompt.input.push(c),
            KeyCode::Enter => {
                let Some(prompt) = self.path_prompt.take() else {
                    return;
                };
                let path = PathBuf::from(prompt.input.trim());
                if prompt.input.trim().is_empty() {
                    return;
                }
                self.use_path(prompt.purpose, path).await;
            }
            _ => {}
        }
    }

    async fn use_path(&mut self, purpose: PathPurpose, path: PathBuf) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match purpose {
            PathPurpose::Attach => {
                let kind = MessageKind::from_path(&path);
                if session.send_media(&path, kind).await.is_ok() {
                    self.chat.selected = None;
                    self.toast_manager.success(format!("Sent {}", kind));
                }
            }
            PathPurpose::Record => {
                session.start_recording(path);
                self.toast_manager
                    .info("Recording: Ctrl+R to send, Esc to discard");
            }
        }
    }

    // ---- settings, profile, help ----

    fn handle_settings_key(&mut self, key: KeyCode) {
        if self.handle_global_key(key) {
            return;
        }
        match key {
            KeyCode::Esc => self.current_view = View::Chat,
            KeyCode::Char('d') => {
                self.pending = Some(PendingAction::DeleteRoom);
                self.dialog_state.show(ConfirmDialog::danger(
                    "Delete room",
                    "Delete this room with all of its messages and media?",
                ));
            }
            _ => {}
        }
    }

    fn handle_profile_key(&mut self, key: KeyCode) {
        if self.handle_global_key(key) {
            return;
        }
        match key {
            KeyCode::Esc => self.current_view = View::Rooms,
            KeyCode::Char('s') => {
                self.pending = Some(PendingAction::SignOut);
                self.dialog_state.show(
                    ConfirmDialog::confirmation("Sign out", "End this session?")
                        .with_confirm_label("Sign out"),
                );
            }
            _ => {}
        }
    }

    fn handle_help_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('?') => self.current_view = self.help_return,
            other => {
                self.handle_global_key(other);
            }
        }
    }

    // ---- dialogs ----

    fn handle_dialog_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => self.dialog_state.cancel(),
            KeyCode::Enter => self.dialog_state.execute_selected(),
            KeyCode::Char('y') | KeyCode::Char('Y') => self.dialog_state.confirm(),
            KeyCode::Tab
            | KeyCode::BackTab
            | KeyCode::Left
            | KeyCode::Right
            | KeyCode::Char('h')
            | KeyCode::Char('l') => self.dialog_state.select_next(),
            _ => {}
        }
    }

    async fn resolve_dialog(&mut self) {
        let result = self.dialog_state.take_result();
        let Some(action) = self.pending.take() else {
            return;
        };
        if result != DialogResult::Confirmed {
            return;
        }

        match action {
            PendingAction::DeleteMessage(message_id) => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                match session.delete_message(&message_id).await {
                    Ok(()) => self.toast_manager.success("Message deleted"),
                    Err(e @ ParlorError::NotOwner(_)) => self.toast_manager.warning(e.to_string()),
                    Err(e) => debug!("Delete failed: {}", e),
                }
            }
            PendingAction::DeleteRoom => self.delete_open_room().await,
            PendingAction::SignOut => self.sign_out().await,
        }
    }

    async fn delete_open_room(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let room_id = session.room_id().to_string();
        match session.delete_room().await {
            Ok(outcome) => {
                self.toast_manager.success(format!(
                    "Room deleted ({} messages)",
                    outcome.messages_deleted
                ));
                if outcome.media_failed > 0 {
                    self.toast_manager.warning(format!(
                        "{} media files could not be removed",
                        outcome.media_failed
                    ));
                }
                self.directory.forget(&room_id);
                self.leave_room();
                self.refresh_rooms().await;
            }
            Err(e) => {
                self.current_view = View::Chat;
                debug!("Room delete failed: {}", e);
            }
        }
    }

    async fn sign_out(&mut self) {
        if let Err(e) = self.services.identity.sign_out().await {
            warn!("Sign-out failed: {}", e);
        }
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        self.auth.sign_out();
        self.sign_in = SignInState::default();
        self.directory = RoomDirectory::new();
        self.selected_room = 0;
        self.current_view = View::SignIn;
        self.toast_manager.info("Signed out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::widgets::ToastLevel;
    use parlor_core::DocumentStore;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).await;
        }
    }

    fn offline_app(dir: &TempDir) -> App {
        let config = ParlorConfig::offline();
        let services = Services::offline(&config).unwrap();
        App::new(
            services,
            &config,
            ThemeStore::with_path(dir.path().join("theme.toml")),
        )
    }

    async fn signed_in_app(dir: &TempDir) -> App {
        let mut app = offline_app(dir);
        app.handle_key(key(KeyCode::Enter)).await;
        app
    }

    async fn open_general(app: &mut App) {
        let index = app
            .directory
            .rooms()
            .iter()
            .position(|r| r.title == "General")
            .unwrap();
        app.selected_room = index;
        app.handle_key(key(KeyCode::Enter)).await;
    }

    fn message_count(app: &App) -> usize {
        app.session.as_ref().map(|s| s.messages().len()).unwrap_or(0)
    }

    mod sign_in_tests {
        use super::*;

        #[tokio::test]
        async fn test_offline_sign_in_lands_on_rooms() {
            let dir = TempDir::new().unwrap();
            let app = signed_in_app(&dir).await;

            assert!(app.auth.is_signed_in());
            assert_eq!(app.current_view, View::Rooms);
            assert_eq!(app.directory.rooms().len(), 3);
        }

        #[tokio::test]
        async fn test_passkey_reports_unavailable() {
            let dir = TempDir::new().unwrap();
            let mut app = offline_app(&dir);

            app.handle_key(key(KeyCode::Down)).await;
            app.handle_key(key(KeyCode::Enter)).await;

            assert!(!app.auth.is_signed_in());
            assert_eq!(app.current_view, View::SignIn);
            assert_eq!(app.auth.errors(), ["E3004".to_string()]);
            assert!(app
                .sign_in
                .last_error
                .as_deref()
                .unwrap()
                .contains("Passkeys not available"));
        }

        #[tokio::test]
        async fn test_sign_out_returns_to_sign_in() {
            let dir = TempDir::new().unwrap();
            let mut app = signed_in_app(&dir).await;

            app.handle_key(key(KeyCode::Char('p'))).await;
            assert_eq!(app.current_view, View::Profile);
            app.handle_key(key(KeyCode::Char('s'))).await;
            app.handle_key(key(KeyCode::Char('y'))).await;

            assert!(!app.auth.is_signed_in());
            assert_eq!(app.current_view, View::SignIn);
            assert!(app.directory.rooms().is_empty());
        }
    }

    mod room_tests {
        use super::*;

        #[tokio::test]
        async fn test_create_room_from_form() {
            let dir = TempDir::new().unwrap();
            let mut app = signed_in_app(&dir).await;

            app.handle_key(key(KeyCode::Char('n'))).await;
            assert_eq!(app.current_view, View::NewRoom);
            type_text(&mut app, "Lobby").await;
            app.handle_key(key(KeyCode::Tab)).await;
            type_text(&mut app, "Say hi").await;
            app.handle_key(key(KeyCode::Enter)).await;

            assert_eq!(app.current_view, View::Rooms);
            assert_eq!(app.directory.rooms().len(), 4);
            let selected = &app.directory.rooms()[app.selected_room];
            assert_eq!(selected.title, "Lobby");
            assert_eq!(selected.description, "Say hi");
        }

        #[tokio::test]
        async fn test_blank_title_stays_on_form() {
            let dir = TempDir::new().unwrap();
            let mut app = signed_in_app(&dir).await;

            app.handle_key(key(KeyCode::Char('n'))).await;
            app.handle_key(key(KeyCode::Enter)).await;

            assert_eq!(app.current_view, View::NewRoom);
            assert_eq!(app.directory.rooms().len(), 3);
        }

        #[tokio::test]
        async fn test_delete_room_from_settings() {
            let dir = TempDir::new().unwrap();
            let mut app = signed_in_app(&dir).await;
            open_general(&mut app).await;

            app.handle_key(ctrl('s')).await;
            assert_eq!(app.current_view, View::RoomSettings);
            app.handle_key(key(KeyCode::Char('d'))).await;
            assert!(app.dialog_state.is_open());
            app.handle_key(key(KeyCode::Tab)).await;
            app.handle_key(key(KeyCode::Enter)).await;

            assert_eq!(app.current_view, View::Rooms);
            assert!(app.session.is_none());
            assert_eq!(app.directory.rooms().len(), 2);
            assert!(app.directory.rooms().iter().all(|r| r.title != "General"));
        }
    }

    mod chat_tests {
        use super::*;

        #[tokio::test]
        async fn test_live_updates_survive_failed_room_fetch() {
            let dir = TempDir::new().unwrap();
            let mut app = signed_in_app(&dir).await;
            let store = app.services.offline_store().unwrap().clone();

            store.fail_gets(true);
            open_general(&mut app).await;
            store.fail_gets(false);

            let session = app.session.as_ref().unwrap();
            assert!(session.error().is_some());
            assert!(!session.is_missing());
            assert!(session.is_subscribed());
            assert_eq!(message_count(&app), 1);

            let room_id = session.room_id().to_string();
            store
                .create_document(
                    "messages",
                    serde_json::json!({
                        "content": "are you there?",
                        "senderId": "someone-else",
                        "senderName": "Bob",
                        "senderPhoto": "",
                        "chatRoomId": room_id,
                        "type": "text"
                    }),
                )
                .await
                .unwrap();

            for _ in 0..50 {
                app.tick().await;
                if message_count(&app) == 2 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            assert_eq!(message_count(&app), 2);
        }

        #[tokio::test]
        async fn test_send_message() {
            let dir = TempDir::new().unwrap();
            let mut app = signed_in_app(&dir).await;
            open_general(&mut app).await;
            assert_eq!(app.current_view, View::Chat);
            assert_eq!(message_count(&app), 1);

            type_text(&mut app, "hello").await;
            app.handle_key(key(KeyCode::Enter)).await;
            app.tick().await;

            let session = app.session.as_ref().unwrap();
            assert_eq!(session.messages().len(), 2);
            assert_eq!(session.messages()[1].content, "hello");
            assert_eq!(session.draft(), "");
        }

        #[tokio::test]
        async fn test_mention_without_key_raises_notice() {
            let dir = TempDir::new().unwrap();
            let mut app = signed_in_app(&dir).await;
            open_general(&mut app).await;

            type_text(&mut app, "@a").await;
            app.handle_key(key(KeyCode::Tab)).await;
            assert_eq!(app.session.as_ref().unwrap().draft(), "@ai ");
            type_text(&mut app, "what time is it?").await;
            app.handle_key(key(KeyCode::Enter)).await;

            let mut warned = false;
            for _ in 0..50 {
                app.tick().await;
                if app
                    .toast_manager
                    .visible()
                    .any(|t| t.level == ToastLevel::Warning)
                {
                    warned = true;
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            assert!(warned, "assistant failure should surface as a toast");
            assert!(!app.dialog_state.is_open());
            assert_eq!(message_count(&app), 2);
        }

        #[tokio::test]
        async fn test_delete_own_message() {
            let dir = TempDir::new().unwrap();
            let mut app = signed_in_app(&dir).await;
            open_general(&mut app).await;
            type_text(&mut app, "oops").await;
            app.handle_key(key(KeyCode::Enter)).await;
            app.tick().await;

            app.handle_key(key(KeyCode::Up)).await;
            app.handle_key(ctrl('d')).await;
            assert!(app.dialog_state.is_open());
            app.handle_key(key(KeyCode::Char('y'))).await;

            assert_eq!(message_count(&app), 1);
        }

        #[tokio::test]
        async fn test_cannot_delete_assistant_message() {
            let dir = TempDir::new().unwrap();
            let mut app = signed_in_app(&dir).await;
            open_general(&mut app).await;

            app.handle_key(key(KeyCode::Up)).await;
            app.handle_key(ctrl('d')).await;

            assert!(!app.dialog_state.is_open());
            assert_eq!(message_count(&app), 1);
        }

        #[tokio::test]
        async fn test_missing_attachment_opens_alert() {
            let dir = TempDir::new().unwrap();
            let mut app = signed_in_app(&dir).await;
            open_general(&mut app).await;

            app.handle_key(ctrl('o')).await;
            assert!(app.path_prompt.is_some());
            let missing = dir.path().join("missing.png");
            type_text(&mut app, &missing.to_string_lossy()).await;
            app.handle_key(key(KeyCode::Enter)).await;

            let dialog = app.dialog_state.dialog.as_ref().unwrap();
            assert_eq!(dialog.title(), "Upload failed");
            assert_eq!(message_count(&app), 1);
        }

        #[tokio::test]
        async fn test_attach_image() {
            let dir = TempDir::new().unwrap();
            let image = dir.path().join("cat.png");
            std::fs::write(&image, b"\x89PNG fake").unwrap();

            let mut app = signed_in_app(&dir).await;
            open_general(&mut app).await;
            app.handle_key(ctrl('o')).await;
            type_text(&mut app, &image.to_string_lossy()).await;
            app.handle_key(key(KeyCode::Enter)).await;

            let session = app.session.as_ref().unwrap();
            let last = session.messages().last().unwrap();
            assert_eq!(last.kind, MessageKind::Image);
            assert!(last.media_file_id().is_some());
        }

        #[tokio::test]
        async fn test_escape_leaves_room() {
            let dir = TempDir::new().unwrap();
            let mut app = signed_in_app(&dir).await;
            open_general(&mut app).await;

            app.handle_key(key(KeyCode::Esc)).await;

            assert_eq!(app.current_view, View::Rooms);
            assert!(app.session.is_none());
        }
    }

    #[tokio::test]
    async fn test_theme_toggle_is_saved() {
        let dir = TempDir::new().unwrap();
        let mut app = signed_in_app(&dir).await;

        app.handle_key(key(KeyCode::Char('t'))).await;

        let saved = ThemeStore::with_path(dir.path().join("theme.toml"))
            .load()
            .unwrap();
        assert_eq!(saved.theme.as_deref(), Some(app.current_theme().slug()));
        assert_ne!(app.current_theme().slug(), "tokyo-night");
    }

    #[test]
    fn test_view_parents() {
        assert_eq!(View::RoomSettings.parent(), Some(View::Chat));
        assert_eq!(View::Chat.parent(), Some(View::Rooms));
        assert_eq!(View::Rooms.parent(), None);
        assert!(View::Chat.takes_text());
        assert!(!View::Profile.takes_text());
    }
}
