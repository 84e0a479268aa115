//! Color themes. Views read colors through [`Theme`] and never hard-code them.

mod palettes;
mod preferences;

pub use palettes::{hex_to_color, ColorPalette};
pub use preferences::{ThemePreferences, ThemeStore};

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    slug: &'static str,
    name: &'static str,
    palette: ColorPalette,
}

impl Theme {
    pub const fn new(slug: &'static str, name: &'static str, palette: ColorPalette) -> Self {
        Self {
            slug,
            name,
            palette,
        }
    }

    /// Identifier used in config files, e.g. `tokyo-night`.
    pub fn slug(&self) -> &'static str {
        self.slug
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn background(&self) -> Color {
        self.palette.background
    }

    pub fn foreground(&self) -> Color {
        self.palette.foreground
    }

    pub fn foreground_dim(&self) -> Color {
        self.palette.foreground_dim
    }

    pub fn surface(&self) -> Color {
        self.palette.surface
    }

    pub fn border(&self) -> Color {
        self.palette.border
    }

    pub fn selection(&self) -> Color {
        self.palette.selection
    }

    pub fn accent(&self) -> Color {
        self.palette.accent
    }

    pub fn accent_secondary(&self) -> Color {
        self.palette.accent_secondary
    }

    pub fn success(&self) -> Color {
        self.palette.success
    }

    pub fn warning(&self) -> Color {
        self.palette.warning
    }

    pub fn error(&self) -> Color {
        self.palette.error
    }

    pub fn info(&self) -> Color {
        self.palette.info
    }

    pub fn panel(&self) -> Style {
        Style::default().bg(self.surface()).fg(self.foreground())
    }

    pub fn dimmed(&self) -> Style {
        Style::default().fg(self.foreground_dim())
    }

    pub fn keybind(&self) -> Style {
        Style::default()
            .fg(self.accent())
            .add_modifier(Modifier::BOLD)
    }

    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.accent())
            .add_modifier(Modifier::BOLD)
    }
}

pub struct ThemeManager {
    themes: Vec<Theme>,
    current_index: usize,
}

impl ThemeManager {
    pub fn new() -> Self {
        Self {
            themes: palettes::builtin(),
            current_index: 0,
        }
    }

    pub fn current_theme(&self) -> &Theme {
        &self.themes[self.current_index]
    }

    pub fn cycle_theme(&mut self) {
        self.current_index = (self.current_index + 1) % self.themes.len();
    }

    /// Accepts either the slug or the display name, case-insensitively.
    pub fn set_theme(&mut self, name: &str) -> bool {
        match self.themes.iter().position(|t| {
            t.slug().eq_ignore_ascii_case(name) || t.name().eq_ignore_ascii_case(name)
        }) {
            Some(index) => {
                self.current_index = index;
                true
            }
            None => false,
        }
    }

    pub fn available_themes(&self) -> Vec<&'static str> {
        self.themes.iter().map(|t| t.slug()).collect()
    }
}

impl Default for ThemeManager {
    fn default() -> Self {
        Self::new()
    }
}
