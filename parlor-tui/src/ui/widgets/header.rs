use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct Header;

impl Header {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(20),
                Constraint::Min(20),
                Constraint::Length(28),
            ])
            .split(area);

        let logo = Paragraph::new(Line::from(vec![
            Span::styled("◆ ", Style::default().fg(theme.accent())),
            Span::styled(
                "Parlor ",
                Style::default()
                    .fg(theme.foreground())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("v{}", VERSION), theme.dimmed()),
        ]));
        frame.render_widget(logo, chunks[0]);

        if app.auth.is_signed_in() {
            let active_tab = match app.current_view {
                View::Profile => View::Profile,
                View::Help => View::Help,
                _ => View::Rooms,
            };
            let titles: Vec<Line> = View::tabs()
                .iter()
                .map(|v| {
                    let style = if *v == active_tab {
                        theme.title()
                    } else {
                        theme.dimmed()
                    };
                    Line::from(Span::styled(v.name(), style))
                })
                .collect();
            let tabs = Tabs::new(titles)
                .select(
                    View::tabs()
                        .iter()
                        .position(|v| *v == active_tab)
                        .unwrap_or(0),
                )
                .highlight_style(Style::default().fg(theme.accent()))
                .divider(Span::raw(" │ "));
            frame.render_widget(tabs, chunks[1]);
        }

        let mut account = Vec::new();
        if app.services.is_offline() {
            account.push(Span::styled(
                "offline ",
                Style::default()
                    .fg(theme.warning())
                    .add_modifier(Modifier::BOLD),
            ));
        }
        if let Some(user) = app.auth.user() {
            account.push(Span::styled(
                user.display_name().to_string(),
                Style::default().fg(theme.foreground()),
            ));
        }
        frame.render_widget(
            Paragraph::new(Line::from(account)).alignment(Alignment::Right),
            chunks[2],
        );
    }
}
