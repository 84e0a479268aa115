use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, SignInStage, SIGN_IN_METHODS};
use crate::ui::layout::centered;

pub struct SignInView;

impl SignInView {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let boxed = centered(area, 60, 16);

        let block = Block::default()
            .title(" Welcome to Parlor ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border()))
            .style(theme.panel());
        let inner = block.inner(boxed);
        frame.render_widget(block, boxed);

        let mut lines = vec![
            Line::from(Span::styled("Sign in to continue", theme.dimmed())),
            Line::from(""),
        ];

        match app.sign_in.stage {
            SignInStage::ChooseMethod => {
                for (index, strategy) in SIGN_IN_METHODS.iter().enumerate() {
                    let selected = index == app.sign_in.selected;
                    let marker = if selected { "▸ " } else { "  " };
                    let style = if selected {
                        theme.title()
                    } else {
                        Style::default().fg(theme.foreground())
                    };
                    lines.push(Line::from(vec![
                        Span::styled(marker, Style::default().fg(theme.accent())),
                        Span::styled(format!("Continue with {}", strategy), style),
                    ]));
                }
            }
            SignInStage::AwaitingBrowser => {
                lines.push(Line::from(Span::styled(
                    "Open this URL in your browser:",
                    Style::default().fg(theme.foreground()),
                )));
                if let Some(challenge) = &app.sign_in.challenge {
                    lines.push(Line::from(Span::styled(
                        challenge.authorize_url.clone(),
                        Style::default()
                            .fg(theme.info())
                            .add_modifier(Modifier::UNDERLINED),
                    )));
                }
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Press Enter once you have finished signing in.",
                    theme.dimmed(),
                )));
            }
        }

        let errors = app.auth.errors();
        if !errors.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Sign-in failed:",
                Style::default()
                    .fg(theme.error())
                    .add_modifier(Modifier::BOLD),
            )));
            for code in errors {
                lines.push(Line::from(Span::styled(
                    format!("  • {}", code),
                    Style::default().fg(theme.error()),
                )));
            }
            if let Some(message) = &app.sign_in.last_error {
                lines.push(Line::from(Span::styled(message.clone(), theme.dimmed())));
            }
        }

        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: false }),
            inner,
        );
    }
}
