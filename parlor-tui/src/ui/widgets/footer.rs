use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, SignInStage, View};

pub struct Footer;

impl Footer {
    /// Key hints for the current view.
    pub fn keybinds(app: &App) -> &'static [(&'static str, &'static str)] {
        if app.path_prompt.is_some() {
            return &[("Enter", "Confirm"), ("Esc", "Cancel")];
        }
        if app.dialog_state.is_open() {
            return &[("Tab", "Switch"), ("Enter", "Select"), ("Esc", "Dismiss")];
        }
        match app.current_view {
            View::SignIn => match app.sign_in.stage {
                SignInStage::ChooseMethod => &[("j/k", "Method"), ("Enter", "Sign in"), ("q", "Quit")],
                SignInStage::AwaitingBrowser => &[("Enter", "Continue"), ("Esc", "Back")],
            },
            View::Rooms => &[
                ("Enter", "Open"),
                ("n", "New"),
                ("r", "Refresh"),
                ("p", "Profile"),
                ("t", "Theme"),
                ("?", "Help"),
                ("q", "Quit"),
            ],
            View::NewRoom => &[("Tab", "Field"), ("Enter", "Create"), ("Esc", "Cancel")],
            View::Chat => &[
                ("Enter", "Send"),
                ("↑/↓", "Select"),
                ("^O", "Attach"),
                ("^R", "Voice"),
                ("^P", "Play"),
                ("^D", "Delete"),
                ("^S", "Settings"),
                ("Esc", "Back"),
            ],
            View::RoomSettings => &[("d", "Delete room"), ("Esc", "Back")],
            View::Profile => &[("s", "Sign out"), ("Esc", "Back"), ("q", "Quit")],
            View::Help => &[("Esc", "Back")],
        }
    }

    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(area);

        let spans: Vec<Span> = Self::keybinds(app)
            .iter()
            .flat_map(|(key, desc)| {
                [
                    Span::styled(format!(" {}", key), theme.keybind()),
                    Span::styled(format!(":{} ", desc), theme.dimmed()),
                ]
            })
            .collect();
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(theme.panel()),
            chunks[0],
        );

        let status = app.status_message.as_deref().unwrap_or("Ready");
        frame.render_widget(
            Paragraph::new(Span::styled(status.to_string(), theme.dimmed()))
                .alignment(Alignment::Right)
                .style(theme.panel()),
            chunks[1],
        );
    }
}
