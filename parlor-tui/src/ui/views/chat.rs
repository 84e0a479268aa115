use parlor_core::{Composer, Message, Phase};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::App;
use crate::theme::Theme;

pub struct ChatView;

impl ChatView {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let Some(session) = app.session.as_ref() else {
            return;
        };

        let suggestions = session.mention_suggestions();
        let composer_height = if suggestions.is_empty() { 3 } else { 4 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(3),
                Constraint::Length(composer_height),
            ])
            .split(area);

        let (title, subtitle) = match (session.room(), session.error()) {
            (Some(room), _) => (room.title.clone(), room.description.clone()),
            (None, Some(err)) => (err.to_string(), String::new()),
            (None, None) => ("Loading…".to_string(), String::new()),
        };
        let header = vec![
            Line::from(Span::styled(title, theme.title())),
            Line::from(Span::styled(subtitle, theme.dimmed())),
        ];
        frame.render_widget(Paragraph::new(header), chunks[0]);

        Self::render_messages(frame, chunks[1], app, theme);
        Self::render_composer(frame, chunks[2], app, theme, &suggestions);
    }

    fn render_messages(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
        let Some(session) = app.session.as_ref() else {
            return;
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border()))
            .style(theme.panel());

        if session.phase() == Phase::Loading {
            frame.render_widget(
                Paragraph::new(Span::styled("Loading messages…", theme.dimmed())).block(block),
                area,
            );
            return;
        }
        if session.messages().is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "No messages yet. Say hello!",
                    theme.dimmed(),
                ))
                .block(block),
                area,
            );
            return;
        }

        let width = area.width.saturating_sub(4).max(10) as usize;
        let viewer = &session.viewer().id;
        let playing = session.audio().playing();
        let items: Vec<ListItem> = session
            .messages()
            .iter()
            .map(|m| Self::message_item(m, viewer, playing, width, theme))
            .collect();

        let last = items.len().saturating_sub(1);
        let mut state = ListState::default().with_selected(Some(app.chat.selected.unwrap_or(last)));
        let highlight = if app.chat.selected.is_some() {
            Style::default().bg(theme.selection())
        } else {
            Style::default()
        };
        let list = List::new(items).block(block).highlight_style(highlight);
        frame.render_stateful_widget(list, area, &mut state);

        let viewport = session.viewport();
        if viewport.show_jump {
            let badge = format!(" ↓ {} new (End) ", viewport.unread);
            let badge_width = (badge.chars().count() as u16).min(area.width);
            let badge_area = Rect {
                x: area.x + area.width.saturating_sub(badge_width + 1),
                y: area.y + area.height.saturating_sub(2),
                width: badge_width,
                height: 1,
            };
            frame.render_widget(
                Paragraph::new(Span::styled(
                    badge,
                    Style::default()
                        .fg(theme.background())
                        .bg(theme.accent())
                        .add_modifier(Modifier::BOLD),
                )),
                badge_area,
            );
        }
    }

    fn message_item<'a>(
        message: &'a Message,
        viewer: &str,
        playing: Option<&str>,
        width: usize,
        theme: &Theme,
    ) -> ListItem<'a> {
        let name_color = if message.is_from(viewer) {
            theme.accent()
        } else if message.is_assistant() {
            theme.accent_secondary()
        } else {
            theme.info()
        };

        let mut lines = vec![Line::from(vec![
            Span::styled(
                message.sender_name.clone(),
                Style::default()
                    .fg(name_color)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", message.meta.created_at.format("%H:%M")),
                theme.dimmed(),
            ),
        ])];

        if message.kind.is_media() {
            let marker = if playing == Some(message.id()) {
                "▶ "
            } else {
                ""
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{}[{}] ", marker, message.kind),
                    Style::default().fg(theme.warning()),
                ),
                Span::styled(message.content.clone(), theme.dimmed()),
            ]));
        } else {
            for line in wrap_text(&message.content, width) {
                lines.push(Line::from(Span::styled(
                    line,
                    Style::default().fg(theme.foreground()),
                )));
            }
        }
        lines.push(Line::from(""));
        ListItem::new(lines)
    }

    fn render_composer(
        frame: &mut Frame,
        area: Rect,
        app: &App,
        theme: &Theme,
        suggestions: &[&str],
    ) {
        let Some(session) = app.session.as_ref() else {
            return;
        };

        let (title, border) = match session.phase() {
            Phase::Ready(Composer::Recording) => (
                " ● Recording (Ctrl+R send, Esc cancel) ".to_string(),
                theme.error(),
            ),
            Phase::Ready(Composer::Uploading) => (" Uploading… ".to_string(), theme.info()),
            _ => (" Message ".to_string(), theme.accent()),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        let mut lines = vec![Line::from(vec![
            Span::styled(
                session.draft().to_string(),
                Style::default().fg(theme.foreground()),
            ),
            Span::styled("▏", Style::default().fg(theme.accent())),
        ])];
        if !suggestions.is_empty() {
            let mut spans = vec![Span::styled("Tab ", theme.keybind())];
            for handle in suggestions {
                spans.push(Span::styled(
                    format!("{} ", handle),
                    Style::default().fg(theme.accent_secondary()),
                ));
            }
            lines.push(Line::from(spans));
        }

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

/// Splits on whitespace into lines of at most `width` characters; longer words are broken.
pub fn wrap_text(content: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in content.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let needed = if current_len == 0 {
                word.len()
            } else {
                current_len + 1 + word.len()
            };
            if needed > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }
        lines.push(current);
    }
    lines
}
