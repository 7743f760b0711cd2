//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::game::level;

/// Accent used for borders, the XP gauge and highlights.
pub const BRAND: Color = Color::Rgb(91, 115, 255);
/// Streak flame.
pub const FLAME: Color = Color::Rgb(251, 146, 60);
/// Sprint stop button / destructive confirmations.
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Dimmed text for completed quests.
pub const MUTED: Color = Color::Rgb(110, 110, 130);

/// Parse a `#RRGGBB` string.
pub fn hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Path colour of a level, falling back to the brand accent.
pub fn level_color(id: u8) -> Color {
    level(id).and_then(|lvl| hex_color(lvl.color)).unwrap_or(BRAND)
}
