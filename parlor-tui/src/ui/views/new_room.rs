use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FormField};
use crate::theme::Theme;
use crate::ui::layout::centered;

pub struct NewRoomView;

impl NewRoomView {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let form = &app.form;
        let boxed = centered(area, 64, 14);

        let block = Block::default()
            .title(" New Chat Room ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border()))
            .style(theme.panel());
        let inner = block.inner(boxed);
        frame.render_widget(block, boxed);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Min(1),
            ])
            .split(inner);

        Self::render_field(
            frame,
            chunks[0],
            theme,
            "Title",
            &form.title,
            app.form_field == FormField::Title,
            None,
        );
        Self::render_field(
            frame,
            chunks[1],
            theme,
            "Description",
            form.description(),
            app.form_field == FormField::Description,
            Some(form.description_counter()),
        );

        let hint = if form.is_submitting() {
            Span::styled("Creating…", Style::default().fg(theme.info()))
        } else if form.can_submit() {
            Span::styled("Press Enter to create the room", theme.dimmed())
        } else {
            Span::styled("A title is required", Style::default().fg(theme.warning()))
        };
        frame.render_widget(Paragraph::new(Line::from(hint)), chunks[2]);
    }

    fn render_field(
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        label: &str,
        value: &str,
        focused: bool,
        counter: Option<String>,
    ) {
        let border = if focused {
            Style::default()
                .fg(theme.accent())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.border())
        };
        let mut block = Block::default()
            .title(format!(" {} ", label))
            .borders(Borders::ALL)
            .border_style(border);
        if let Some(counter) = counter {
            block = block.title_bottom(Line::from(Span::styled(counter, theme.dimmed())).right_aligned());
        }

        let mut spans = vec![Span::styled(
            value.to_string(),
            Style::default().fg(theme.foreground()),
        )];
        if focused {
            spans.push(Span::styled("▏", Style::default().fg(theme.accent())));
        }
        frame.render_widget(
            Paragraph::new(Line::from(spans))
                .block(block)
                .wrap(Wrap { trim: false }),
            area,
        );
    }
}
