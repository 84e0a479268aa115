use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::theme::Theme;

const GENERAL_KEYS: &[(&str, &str)] = &[
    ("Tab", "Next tab"),
    ("Shift+Tab", "Previous tab"),
    ("j / ↓", "Move down"),
    ("k / ↑", "Move up"),
    ("Enter", "Open room"),
    ("n", "New room"),
    ("r", "Refresh rooms"),
    ("p", "Profile"),
    ("t", "Cycle theme"),
    ("?", "Toggle help"),
    ("q / Ctrl+C", "Quit"),
];

const CHAT_KEYS: &[(&str, &str)] = &[
    ("Enter", "Send message"),
    ("@ai", "Ask the assistant"),
    ("Tab", "Complete mention"),
    ("↑ / ↓", "Select message"),
    ("End", "Jump to latest"),
    ("Ctrl+O", "Attach a file"),
    ("Ctrl+R", "Voice message"),
    ("Ctrl+P", "Play / stop audio"),
    ("Ctrl+D", "Delete your message"),
    ("Ctrl+S", "Room settings"),
    ("Esc", "Back to rooms"),
];

pub struct HelpView;

impl HelpView {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        Self::render_keys(frame, chunks[0], theme, " Navigation ", GENERAL_KEYS);
        Self::render_keys(frame, chunks[1], theme, " Chat Room ", CHAT_KEYS);
    }

    fn render_keys(
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        title: &str,
        keys: &[(&str, &str)],
    ) {
        let block = Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border()))
            .style(theme.panel());

        let lines: Vec<Line> = keys
            .iter()
            .map(|(key, desc)| {
                Line::from(vec![
                    Span::styled(format!("  {:<14}", key), theme.keybind()),
                    Span::styled(desc.to_string(), Style::default().fg(theme.foreground())),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}
