//! Modal dialogs: confirmations before destructive actions and blocking alerts.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogButton {
    Confirm,
    Cancel,
}

impl DialogButton {
    pub fn other(&self) -> Self {
        match self {
            DialogButton::Confirm => DialogButton::Cancel,
            DialogButton::Cancel => DialogButton::Confirm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Confirmation,
    Danger,
    /// Single acknowledge button.
    Alert,
}

impl DialogKind {
    pub fn icon(&self) -> &'static str {
        match self {
            DialogKind::Confirmation => "?",
            DialogKind::Danger => "⚠",
            DialogKind::Alert => "✗",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    title: String,
    message: String,
    kind: DialogKind,
    selected: DialogButton,
    confirm_label: String,
    cancel_label: String,
}

impl ConfirmDialog {
    pub fn confirmation(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: DialogKind::Confirmation,
            selected: DialogButton::Cancel,
            confirm_label: "Confirm".to_string(),
            cancel_label: "Cancel".to_string(),
        }
    }

    /// Destructive action. Cancel stays selected until the user moves.
    pub fn danger(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Danger,
            confirm_label: "Delete".to_string(),
            ..Self::confirmation(title, message)
        }
    }

    pub fn alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Alert,
            selected: DialogButton::Confirm,
            confirm_label: "OK".to_string(),
            ..Self::confirmation(title, message)
        }
    }

    pub fn with_confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = label.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> DialogKind {
        self.kind
    }

    pub fn selected(&self) -> DialogButton {
        self.selected
    }

    pub fn select_next(&mut self) {
        if self.kind != DialogKind::Alert {
            self.selected = self.selected.other();
        }
    }

    pub fn calculate_area(&self, screen: Rect) -> Rect {
        let width = 54u16.min(screen.width.saturating_sub(4));
        let height = 9u16.min(screen.height.saturating_sub(4));
        Rect::new(
            (screen.width.saturating_sub(width)) / 2,
            (screen.height.saturating_sub(height)) / 2,
            width,
            height,
        )
    }

    pub fn render(&self, frame: &mut Frame, screen: Rect, theme: &Theme) {
        let area = self.calculate_area(screen);
        frame.render_widget(Clear, area);

        let border_color = match self.kind {
            DialogKind::Confirmation => theme.accent(),
            DialogKind::Danger | DialogKind::Alert => theme.error(),
        };

        let block = Block::default()
            .title(format!(" {} {} ", self.kind.icon(), self.title))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(
                Style::default()
                    .fg(border_color)
                    .add_modifier(Modifier::BOLD),
            )
            .style(theme.panel());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        let message = Paragraph::new(self.message.as_str())
            .style(Style::default().fg(theme.foreground()))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(message, chunks[0]);

        frame.render_widget(
            Paragraph::new(Span::styled(
                "─".repeat(chunks[1].width as usize),
                Style::default().fg(theme.border()),
            )),
            chunks[1],
        );

        let active = |button: DialogButton| self.selected == button;
        let confirm_bg = match self.kind {
            DialogKind::Danger => theme.error(),
            _ => theme.accent(),
        };
        let confirm_style = if active(DialogButton::Confirm) {
            Style::default()
                .fg(theme.background())
                .bg(confirm_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(confirm_bg)
        };
        let confirm = Paragraph::new(Span::styled(
            format!(" {} ", self.confirm_label),
            confirm_style,
        ))
        .alignment(Alignment::Center);

        if self.kind == DialogKind::Alert {
            frame.render_widget(confirm, chunks[2]);
            return;
        }

        let buttons = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);
        let cancel_style = if active(DialogButton::Cancel) {
            Style::default()
                .fg(theme.background())
                .bg(theme.foreground())
                .add_modifier(Modifier::BOLD)
        } else {
            theme.dimmed()
        };
        let cancel = Paragraph::new(Line::from(Span::styled(
            format!(" {} ", self.cancel_label),
            cancel_style,
        )))
        .alignment(Alignment::Center);

        frame.render_widget(cancel, buttons[0]);
        frame.render_widget(confirm, buttons[1]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResult {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug)]
pub struct DialogState {
    pub dialog: Option<ConfirmDialog>,
    result: DialogResult,
}

impl DialogState {
    pub fn new() -> Self {
        Self {
            dialog: None,
            result: DialogResult::Pending,
        }
    }

    pub fn show(&mut self, dialog: ConfirmDialog) {
        self.dialog = Some(dialog);
        self.result = DialogResult::Pending;
    }

    pub fn is_open(&self) -> bool {
        self.dialog.is_some()
    }

    pub fn confirm(&mut self) {
        if self.dialog.take().is_some() {
            self.result = DialogResult::Confirmed;
        }
    }

    pub fn cancel(&mut self) {
        if let Some(dialog) = self.dialog.take() {
            // Dismissing an alert is the same as acknowledging it.
            self.result = match dialog.kind() {
                DialogKind::Alert => DialogResult::Confirmed,
                _ => DialogResult::Cancelled,
            };
        }
    }

    pub fn select_next(&mut self) {
        if let Some(dialog) = self.dialog.as_mut() {
            dialog.select_next();
        }
    }

    pub fn execute_selected(&mut self) {
        match self.dialog.as_ref().map(|d| d.selected()) {
            Some(DialogButton::Confirm) => self.confirm(),
            Some(DialogButton::Cancel) => self.cancel(),
            None => {}
        }
    }

    pub fn take_result(&mut self) -> DialogResult {
        std::mem::replace(&mut self.result, DialogResult::Pending)
    }
}

impl Default for DialogState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_danger_defaults_to_cancel() {
        let dialog = ConfirmDialog::danger("Delete room", "This removes every message.");
        assert_eq!(dialog.kind(), DialogKind::Danger);
        assert_eq!(dialog.selected(), DialogButton::Cancel);
    }

    #[test]
    fn test_alert_has_single_button() {
        let mut dialog = ConfirmDialog::alert("Upload failed", "disk full");
        assert_eq!(dialog.selected(), DialogButton::Confirm);
        dialog.select_next();
        assert_eq!(dialog.selected(), DialogButton::Confirm);
    }

    #[test]
    fn test_state_confirm_after_selecting() {
        let mut state = DialogState::new();
        state.show(ConfirmDialog::danger("Delete", "Sure?"));

        state.execute_selected();
        assert_eq!(state.take_result(), DialogResult::Cancelled);

        state.show(ConfirmDialog::danger("Delete", "Sure?"));
        state.select_next();
        state.execute_selected();
        assert!(!state.is_open());
        assert_eq!(state.take_result(), DialogResult::Confirmed);
        assert_eq!(state.take_result(), DialogResult::Pending);
    }

    #[test]
    fn test_dismissed_alert_counts_as_acknowledged() {
        let mut state = DialogState::new();
        state.show(ConfirmDialog::alert("Error", "boom"));
        state.cancel();
        assert_eq!(state.take_result(), DialogResult::Confirmed);
    }

    #[test]
    fn test_area_fits_screen() {
        let dialog = ConfirmDialog::confirmation("Sign out", "End this session?");
        let screen = Rect::new(0, 0, 100, 40);
        let area = dialog.calculate_area(screen);
        assert!(area.x > 0 && area.y > 0);
        assert!(area.right() <= screen.width);
        assert!(area.bottom() <= screen.height);
    }
}
