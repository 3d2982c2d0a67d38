//! Tile palette: one fixed colour per piece family, plus alpha compositing for the ghost.

use ratatui::style::Color;

/// Fully opaque alpha.
pub const OPAQUE: u8 = 255;

/// Alpha of the hard-drop ghost preview.
pub const GHOST_ALPHA: u8 = 64;

/// Straight (non-premultiplied) RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: OPAQUE }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Composite this colour over an opaque background. Terminals have no alpha channel.
    pub fn over(self, bg: Color) -> Color {
        if self.a == OPAQUE {
            return Color::Rgb(self.r, self.g, self.b);
        }
        let (r, g, b) = rgb_of(bg);
        let a = u16::from(self.a);
        let mix = |fg: u8, under: u8| ((u16::from(fg) * a + u16::from(under) * (255 - a)) / 255) as u8;
        Color::Rgb(mix(self.r, r), mix(self.g, g), mix(self.b, b))
    }
}

/// The seven tile colours. Each shape kind owns exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tile {
    White,
    Red,
    Green,
    Blue,
    Yellow,
    Magenta,
    Cyan,
}

impl Tile {
    pub const fn rgba(self) -> Rgba {
        match self {
            Self::White => Rgba::opaque(255, 255, 255),
            Self::Red => Rgba::opaque(255, 0, 0),
            Self::Green => Rgba::opaque(0, 255, 0),
            Self::Blue => Rgba::opaque(0, 0, 255),
            Self::Yellow => Rgba::opaque(255, 255, 0),
            Self::Magenta => Rgba::opaque(255, 0, 255),
            Self::Cyan => Rgba::opaque(0, 255, 255),
        }
    }

    /// Terminal colour for this tile drawn at `alpha` over `bg`.
    #[inline]
    pub fn color(self, alpha: u8, bg: Color) -> Color {
        self.rgba().with_alpha(alpha).over(bg)
    }
}

/// Best-effort RGB for a ratatui colour (named colours use their nominal values).
fn rgb_of(color: Color) -> (u8, u8, u8) {
    match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Black | Color::Reset => (0, 0, 0),
        Color::Red => (255, 0, 0),
        Color::Green => (0, 255, 0),
        Color::Yellow => (255, 255, 0),
        Color::Blue => (0, 0, 255),
        Color::Magenta => (255, 0, 255),
        Color::Cyan => (0, 255, 255),
        Color::Gray => (128, 128, 128),
        Color::DarkGray => (64, 64, 64),
        Color::White => (255, 255, 255),
        _ => (128, 128, 128),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_tile_ignores_background() {
        let c = Tile::Blue.color(OPAQUE, Color::Rgb(10, 20, 30));
        assert_eq!(c, Color::Rgb(0, 0, 255));
    }

    #[test]
    fn ghost_blends_toward_background() {
        let c = Tile::White.color(GHOST_ALPHA, Color::Rgb(0, 0, 0));
        // 255 * 64 / 255
        assert_eq!(c, Color::Rgb(64, 64, 64));

        let c = Tile::Red.color(0, Color::Rgb(49, 53, 63));
        assert_eq!(c, Color::Rgb(49, 53, 63));
    }

    #[test]
    fn tiles_are_distinct() {
        let all = [
            Tile::White,
            Tile::Red,
            Tile::Green,
            Tile::Blue,
            Tile::Yellow,
            Tile::Magenta,
            Tile::Cyan,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.rgba(), b.rgba());
            }
        }
    }
}
