//! Non-blocking notices stacked in the top-right corner.

use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            ToastLevel::Info => "ℹ",
            ToastLevel::Success => "✓",
            ToastLevel::Warning => "⚠",
            ToastLevel::Error => "✗",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub created_at: Instant,
    pub duration: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>, level: ToastLevel) -> Self {
        let duration = match level {
            ToastLevel::Warning | ToastLevel::Error => Duration::from_secs(6),
            _ => Duration::from_secs(3),
        };
        Self {
            message: message.into(),
            level,
            created_at: Instant::now(),
            duration,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.duration
    }

    /// Remaining lifetime from 1.0 down to 0.0.
    pub fn progress(&self) -> f32 {
        let elapsed = self.created_at.elapsed().as_secs_f32();
        let total = self.duration.as_secs_f32().max(f32::EPSILON);
        1.0 - (elapsed / total).clamp(0.0, 1.0)
    }
}

#[derive(Debug)]
pub struct ToastManager {
    toasts: Vec<Toast>,
    max_visible: usize,
}

impl ToastManager {
    pub fn new() -> Self {
        Self {
            toasts: Vec::new(),
            max_visible: 4,
        }
    }

    pub fn push(&mut self, toast: Toast) {
        self.toasts.push(toast);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Toast::new(message, ToastLevel::Info));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Toast::new(message, ToastLevel::Success));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Toast::new(message, ToastLevel::Warning));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Toast::new(message, ToastLevel::Error));
    }

    pub fn cleanup(&mut self) {
        self.toasts.retain(|t| !t.is_expired());
    }

    /// Newest first.
    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter().rev().take(self.max_visible)
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn render(&self, frame: &mut Frame, screen: Rect, theme: &Theme) {
        let width = 44u16.min(screen.width.saturating_sub(4));
        let height = 3u16;
        let x = screen.width.saturating_sub(width + 2);
        let mut y = 4u16;

        for toast in self.visible() {
            if y + height > screen.height {
                break;
            }
            Self::render_toast(frame, Rect::new(x, y, width, height), toast, theme);
            y += height + 1;
        }
    }

    fn render_toast(frame: &mut Frame, area: Rect, toast: &Toast, theme: &Theme) {
        frame.render_widget(Clear, area);

        let color = match toast.level {
            ToastLevel::Info => theme.info(),
            ToastLevel::Success => theme.success(),
            ToastLevel::Warning => theme.warning(),
            ToastLevel::Error => theme.error(),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .style(theme.panel());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let room = (inner.width as usize).saturating_sub(2);
        let content = Line::from(vec![
            Span::styled(
                format!("{} ", toast.level.icon()),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                ellipsize(&toast.message, room),
                Style::default().fg(theme.foreground()),
            ),
        ]);
        frame.render_widget(Paragraph::new(content), inner);

        let bar = ((inner.width as f32) * toast.progress()) as u16;
        if bar > 0 && area.height > 2 {
            let bar_area = Rect::new(inner.x, area.y + area.height - 1, bar, 1);
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "─".repeat(bar as usize),
                    Style::default().fg(color),
                )),
                bar_area,
            );
        }
    }
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Cuts `text` to `max` characters, ending in an ellipsis when shortened.
pub fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_toasts_linger_longer() {
        let info = Toast::new("saved", ToastLevel::Info);
        let error = Toast::new("failed", ToastLevel::Error);
        assert!(error.duration > info.duration);
        assert!(!info.is_expired());
    }

    #[test]
    fn test_manager_cleanup_drops_expired() {
        let mut manager = ToastManager::new();
        manager.push(Toast::new("gone", ToastLevel::Info).with_duration(Duration::from_millis(1)));
        manager.warning("stays");

        std::thread::sleep(Duration::from_millis(10));
        manager.cleanup();

        assert_eq!(manager.len(), 1);
        assert_eq!(manager.visible().next().unwrap().message, "stays");
    }

    #[test]
    fn test_visible_is_newest_first_and_capped() {
        let mut manager = ToastManager::new();
        for i in 0..6 {
            manager.info(format!("toast {}", i));
        }
        let visible: Vec<_> = manager.visible().map(|t| t.message.clone()).collect();
        assert_eq!(visible.len(), 4);
        assert_eq!(visible[0], "toast 5");
    }

    #[test]
    fn test_ellipsize_is_char_safe() {
        assert_eq!(ellipsize("short", 10), "short");
        assert_eq!(ellipsize("héllo wörld", 6), "héllo…");
    }
}
