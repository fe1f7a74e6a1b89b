use ratatui::style::Color;
use term_color_support::ColorSupport;

/// Color capability of the attached terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    TrueColor,
    Ansi256,
    Basic,
}

impl Depth {
    pub fn detect() -> Depth {
        let support = ColorSupport::stdout();
        if support.has_16m {
            Depth::TrueColor
        } else if support.has_256 {
            Depth::Ansi256
        } else {
            Depth::Basic
        }
    }

    /// Pin a base ANSI color to the Windows Terminal "Campbell" look so tiles
    /// render the same everywhere. Basic terminals keep the ANSI variant.
    pub fn resolve(self, color: Color) -> Color {
        match (self, campbell(color)) {
            (Depth::TrueColor, Some(((r, g, b), _))) => Color::Rgb(r, g, b),
            (Depth::Ansi256, Some((_, index))) => Color::Indexed(index),
            _ => color,
        }
    }
}

// ((R, G, B), stable ANSI-256 index) sampled from the Campbell scheme
fn campbell(color: Color) -> Option<((u8, u8, u8), u8)> {
    match color {
        Color::Black => Some(((12, 12, 12), 232)),
        Color::Red => Some(((197, 15, 31), 160)),
        Color::Green => Some(((19, 161, 14), 28)),
        Color::Yellow => Some(((193, 156, 0), 178)),
        Color::Blue => Some(((0, 55, 218), 20)),
        Color::Magenta => Some(((136, 23, 152), 90)),
        Color::Cyan => Some(((58, 150, 221), 38)),
        Color::Gray => Some(((204, 204, 204), 250)),
        Color::DarkGray => Some(((118, 118, 118), 243)),
        Color::LightRed => Some(((231, 72, 86), 203)),
        Color::LightBlue => Some(((59, 120, 255), 63)),
        Color::White => Some(((242, 242, 242), 255)),
        _ => None,
    }
}

/// Every color the board and labels use, resolved once at startup
#[derive(Debug, Clone)]
pub struct Palette {
    pub board_bg: Color,
    pub cursor_bg: Color,
    pub hidden_fg: Color,
    pub flag_fg: Color,
    pub mine_fg: Color,
    pub exploded_bg: Color,
    pub wrong_fg: Color,
    pub key_fg: Color,
    pub button_bg: Color,
    pub numbers: [Color; 8],
}

impl Palette {
    pub fn new(depth: Depth) -> Palette {
        let c = |color| depth.resolve(color);
        Palette {
            board_bg: c(Color::DarkGray),
            cursor_bg: c(Color::LightBlue),
            hidden_fg: c(Color::Gray),
            flag_fg: c(Color::Red),
            mine_fg: c(Color::Black),
            exploded_bg: c(Color::Red),
            wrong_fg: c(Color::LightRed),
            key_fg: c(Color::Yellow),
            button_bg: c(Color::Gray),
            numbers: [
                c(Color::Blue),
                c(Color::Green),
                c(Color::Red),
                c(Color::Magenta),
                c(Color::Yellow),
                c(Color::Cyan),
                c(Color::Black),
                c(Color::White),
            ],
        }
    }

    pub fn detect() -> Palette {
        Palette::new(Depth::detect())
    }

    /// Color for an adjacency count in 1..=8
    pub fn number(&self, n: u8) -> Color {
        self.numbers[(n as usize).clamp(1, 8) - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_follows_depth() {
        assert_eq!(Depth::TrueColor.resolve(Color::Red), Color::Rgb(197, 15, 31));
        assert_eq!(Depth::Ansi256.resolve(Color::Red), Color::Indexed(160));
        assert_eq!(Depth::Basic.resolve(Color::Red), Color::Red);
        assert_eq!(Depth::TrueColor.resolve(Color::Rgb(1, 2, 3)), Color::Rgb(1, 2, 3));
    }

    #[test]
    fn number_colors_are_indexed_from_one() {
        let palette = Palette::new(Depth::Basic);
        assert_eq!(palette.number(1), Color::Blue);
        assert_eq!(palette.number(8), Color::White);
    }
}
