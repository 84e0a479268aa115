use ratatui::style::Color;

use super::Theme;

#[derive(Debug, Clone, Copy)]
pub struct ColorPalette {
    pub background: Color,
    pub foreground: Color,
    pub foreground_dim: Color,
    pub surface: Color,
    pub border: Color,
    pub selection: Color,
    pub accent: Color,
    pub accent_secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
}

pub const fn hex_to_color(hex: u32) -> Color {
    Color::Rgb(
        ((hex >> 16) & 0xFF) as u8,
        ((hex >> 8) & 0xFF) as u8,
        (hex & 0xFF) as u8,
    )
}

const TOKYO_NIGHT: ColorPalette = ColorPalette {
    background: hex_to_color(0x1a1b26),
    foreground: hex_to_color(0xc0caf5),
    foreground_dim: hex_to_color(0x565f89),
    surface: hex_to_color(0x24283b),
    border: hex_to_color(0x414868),
    selection: hex_to_color(0x364a82),
    accent: hex_to_color(0x7aa2f7),
    accent_secondary: hex_to_color(0xbb9af7),
    success: hex_to_color(0x9ece6a),
    warning: hex_to_color(0xe0af68),
    error: hex_to_color(0xf7768e),
    info: hex_to_color(0x7dcfff),
};

const NORD: ColorPalette = ColorPalette {
    background: hex_to_color(0x2e3440),
    foreground: hex_to_color(0xeceff4),
    foreground_dim: hex_to_color(0x4c566a),
    surface: hex_to_color(0x3b4252),
    border: hex_to_color(0x4c566a),
    selection: hex_to_color(0x434c5e),
    accent: hex_to_color(0x88c0d0),
    accent_secondary: hex_to_color(0x81a1c1),
    success: hex_to_color(0xa3be8c),
    warning: hex_to_color(0xebcb8b),
    error: hex_to_color(0xbf616a),
    info: hex_to_color(0x5e81ac),
};

// Light theme for bright terminals.
const PAPER: ColorPalette = ColorPalette {
    background: hex_to_color(0xfaf8f5),
    foreground: hex_to_color(0x2d2a26),
    foreground_dim: hex_to_color(0x8a847b),
    surface: hex_to_color(0xf0ece4),
    border: hex_to_color(0xc9c2b6),
    selection: hex_to_color(0xdcd3c3),
    accent: hex_to_color(0x3a6ea5),
    accent_secondary: hex_to_color(0x8e5ba8),
    success: hex_to_color(0x3f7d3a),
    warning: hex_to_color(0xb07d1a),
    error: hex_to_color(0xb3423b),
    info: hex_to_color(0x2f7f8f),
};

pub(super) fn builtin() -> Vec<Theme> {
    vec![
        Theme::new("tokyo-night", "Tokyo Night", TOKYO_NIGHT),
        Theme::new("nord", "Nord", NORD),
        Theme::new("paper", "Paper", PAPER),
    ]
}
