use ratatui::{
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, PathPurpose, View};
use crate::ui::views::{
    ChatView, HelpView, NewRoomView, ProfileView, RoomSettingsView, RoomsView, SignInView,
};
use crate::ui::widgets::{Footer, Header};

pub struct MainLayout;

impl MainLayout {
    pub fn render(frame: &mut Frame, app: &App) {
        let theme = app.current_theme();
        let size = frame.area();

        frame.render_widget(
            Block::default().style(
                Style::default()
                    .bg(theme.background())
                    .fg(theme.foreground()),
            ),
            size,
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(8),
                Constraint::Length(1),
            ])
            .split(size);

        Header::render(frame, chunks[0], app);

        let content = chunks[1].inner(Margin::new(1, 0));
        match app.current_view {
            View::SignIn => SignInView::render(frame, content, app),
            View::Rooms => RoomsView::render(frame, content, app),
            View::NewRoom => NewRoomView::render(frame, content, app),
            View::Chat => ChatView::render(frame, content, app),
            View::RoomSettings => RoomSettingsView::render(frame, content, app),
            View::Profile => ProfileView::render(frame, content, app),
            View::Help => HelpView::render(frame, content, app),
        }

        Footer::render(frame, chunks[2], app);

        if let Some(prompt) = &app.path_prompt {
            Self::render_path_prompt(frame, size, app, prompt.purpose, &prompt.input);
        }

        app.toast_manager.render(frame, size, theme);

        if let Some(dialog) = &app.dialog_state.dialog {
            dialog.render(frame, size, theme);
        }
    }

    fn render_path_prompt(
        frame: &mut Frame,
        screen: Rect,
        app: &App,
        purpose: PathPurpose,
        input: &str,
    ) {
        let theme = app.current_theme();
        let area = centered(screen, 64, 5);
        frame.render_widget(Clear, area);

        let title = match purpose {
            PathPurpose::Attach => " Attach a file ",
            PathPurpose::Record => " Voice message from file ",
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(
                Style::default()
                    .fg(theme.accent())
                    .add_modifier(Modifier::BOLD),
            )
            .style(theme.panel());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = vec![
            Line::from(vec![
                Span::styled("Path: ", theme.dimmed()),
                Span::styled(input.to_string(), Style::default().fg(theme.foreground())),
                Span::styled("▏", Style::default().fg(theme.accent())),
            ]),
            Line::from(""),
            Line::from(Span::styled("Enter to confirm, Esc to cancel", theme.dimmed())),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

/// A `width` x `height` box in the middle of `area`, shrunk to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    )
}
