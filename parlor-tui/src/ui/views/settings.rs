use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

pub struct RoomSettingsView;

impl RoomSettingsView {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let block = Block::default()
            .title(" Room Settings ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border()))
            .style(theme.panel());

        let Some(session) = app.session.as_ref() else {
            frame.render_widget(block, area);
            return;
        };

        let label = |text: &'static str| {
            Span::styled(
                format!("  {:<14}", text),
                Style::default()
                    .fg(theme.accent())
                    .add_modifier(Modifier::BOLD),
            )
        };
        let value = |text: String| Span::styled(text, Style::default().fg(theme.foreground()));

        let mut lines = Vec::new();
        match session.room() {
            Some(room) => {
                lines.push(Line::from(vec![label("Title"), value(room.title.clone())]));
                lines.push(Line::from(vec![
                    label("Description"),
                    value(if room.description.is_empty() {
                        "-".to_string()
                    } else {
                        room.description.clone()
                    }),
                ]));
                lines.push(Line::from(vec![label("Room ID"), value(room.id().to_string())]));
                lines.push(Line::from(vec![
                    label("Created"),
                    value(room.meta.created_at.format("%Y-%m-%d %H:%M UTC").to_string()),
                ]));
                lines.push(Line::from(vec![
                    label("Last activity"),
                    value(room.meta.updated_at.format("%Y-%m-%d %H:%M UTC").to_string()),
                ]));
            }
            None => lines.push(Line::from(Span::styled(
                session.error().unwrap_or("Room details unavailable").to_string(),
                Style::default().fg(theme.error()),
            ))),
        }
        lines.push(Line::from(vec![
            label("Messages"),
            value(session.messages().len().to_string()),
        ]));
        lines.push(Line::from(vec![
            label("Live updates"),
            value(if session.is_subscribed() { "on" } else { "off" }.to_string()),
        ]));

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Danger zone",
            Style::default()
                .fg(theme.error())
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(vec![
            Span::styled("  d ", theme.keybind()),
            Span::styled(
                "Delete this room, its messages and their media",
                theme.dimmed(),
            ),
        ]));

        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }
}
