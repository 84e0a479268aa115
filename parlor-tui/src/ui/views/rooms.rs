use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::ui::widgets::ellipsize;

pub struct RoomsView;

impl RoomsView {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let directory = &app.directory;

        let block = Block::default()
            .title(format!(" Chat Rooms ({}) ", directory.rooms().len()))
            .title_bottom(
                Line::from(vec![
                    Span::styled(" Enter ", theme.keybind()),
                    Span::styled("open  ", theme.dimmed()),
                    Span::styled("n ", theme.keybind()),
                    Span::styled("new room ", theme.dimmed()),
                ])
                .alignment(Alignment::Center),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border()))
            .style(theme.panel());

        if directory.is_empty() || !directory.is_loaded() {
            let message = if !directory.is_loaded() || directory.is_refreshing() {
                "Loading chat rooms…".to_string()
            } else if let Some(error) = directory.last_error() {
                format!("Could not load rooms: {}", error)
            } else {
                "No chat rooms yet. Press n to create one.".to_string()
            };
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(
                Paragraph::new(Span::styled(message, theme.dimmed())).alignment(Alignment::Center),
                Rect::new(inner.x, inner.y + inner.height / 2, inner.width, 1),
            );
            return;
        }

        let header = Row::new(vec![
            Cell::from("Title"),
            Cell::from("Description"),
            Cell::from("Last activity"),
        ])
        .style(
            Style::default()
                .fg(theme.accent())
                .add_modifier(Modifier::BOLD),
        )
        .bottom_margin(1);

        let description_width = (area.width as usize).saturating_sub(46);
        let rows: Vec<Row> = directory
            .rooms()
            .iter()
            .map(|room| {
                Row::new(vec![
                    Cell::from(Span::styled(
                        room.title.clone(),
                        Style::default().fg(theme.foreground()),
                    )),
                    Cell::from(Span::styled(
                        ellipsize(&room.description, description_width.max(8)),
                        theme.dimmed(),
                    )),
                    Cell::from(Span::styled(
                        relative_time(room.meta.updated_at, Utc::now()),
                        theme.dimmed(),
                    )),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(24),
                Constraint::Min(10),
                Constraint::Length(16),
            ],
        )
        .header(header)
        .block(block)
        .row_highlight_style(
            Style::default()
                .bg(theme.selection())
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

        let mut state = TableState::default().with_selected(Some(app.selected_room));
        frame.render_stateful_widget(table, area, &mut state);

        if let Some(error) = directory.last_error() {
            let line = Rect::new(area.x + 2, area.y, area.width.saturating_sub(4), 1);
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!(" stale: {} ", error),
                    Style::default().fg(theme.warning()),
                ))
                .alignment(Alignment::Right),
                line,
            );
        }
    }
}

/// Short age label such as `5 min ago`, or a date for anything older than a week.
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);
    if elapsed.num_seconds() < 60 {
        "just now".to_string()
    } else if elapsed.num_minutes() < 60 {
        format!("{} min ago", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{} h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{} d ago", elapsed.num_days())
    } else {
        at.with_timezone(&Local).format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_relative_time() {
        let now = Utc::now();
        assert_eq!(relative_time(now - Duration::seconds(5), now), "just now");
        assert_eq!(relative_time(now - Duration::minutes(5), now), "5 min ago");
        assert_eq!(relative_time(now - Duration::hours(3), now), "3 h ago");
        assert_eq!(relative_time(now - Duration::days(2), now), "2 d ago");
        assert_eq!(relative_time(now - Duration::days(30), now).len(), 10);
    }
}
