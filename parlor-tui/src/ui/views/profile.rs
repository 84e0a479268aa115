use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;

pub struct ProfileView;

impl ProfileView {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let block = Block::default()
            .title(" Profile ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border()))
            .style(theme.panel());

        let Some(user) = app.auth.user() else {
            frame.render_widget(
                Paragraph::new(Span::styled("Not signed in", theme.dimmed())).block(block),
                area,
            );
            return;
        };

        let row = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(
                    format!("  {:<10}", label),
                    Style::default()
                        .fg(theme.accent())
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(value, Style::default().fg(theme.foreground())),
            ])
        };

        let backend = if app.services.is_offline() {
            "offline (in-memory)"
        } else {
            "hosted"
        };
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("  {}", user.display_name()),
                theme.title(),
            )),
            Line::from(""),
            row("Email", user.email.clone().unwrap_or_else(|| "-".to_string())),
            row("User ID", user.id.clone()),
            row("Avatar", user.avatar_url().to_string()),
            row(
                "Session",
                app.auth.session_id().unwrap_or("-").to_string(),
            ),
            row("Backend", backend.to_string()),
            Line::from(""),
            Line::from(vec![
                Span::styled("  s ", theme.keybind()),
                Span::styled("Sign out", theme.dimmed()),
            ]),
        ];

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}
