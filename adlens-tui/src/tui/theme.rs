use ratatui::style::Color;

/// Colors by what they mark in the report view rather than by hue.
pub struct Theme {
    pub bar_bg: Color,
    pub bar_fg: Color,
    pub focus: Color,
    pub metric: Color,    // numeric report columns
    pub dimension: Color, // text report columns
    pub filter_badge: Color,
    pub muted: Color,
    pub load_error: Color,
    pub attention: Color, // empty result, blocked Apply
    pub apply_ready: Color,
}

pub const THEME_NAMES: [&str; 3] = ["dark", "light", "colorblind"];

impl Theme {
    pub fn dark() -> Self {
        Self {
            bar_bg: Color::Rgb(24, 26, 33),
            bar_fg: Color::Gray,
            focus: Color::LightBlue,
            metric: Color::Cyan,
            dimension: Color::White,
            filter_badge: Color::LightMagenta,
            muted: Color::DarkGray,
            load_error: Color::LightRed,
            attention: Color::Yellow,
            apply_ready: Color::LightGreen,
        }
    }

    pub fn light() -> Self {
        Self {
            bar_bg: Color::Rgb(230, 232, 238),
            bar_fg: Color::Black,
            focus: Color::Blue,
            metric: Color::Rgb(0, 95, 135),
            dimension: Color::Black,
            filter_badge: Color::Magenta,
            muted: Color::Gray,
            load_error: Color::Red,
            attention: Color::Rgb(175, 95, 0),
            apply_ready: Color::Green,
        }
    }

    // blue/orange instead of green/red
    pub fn colorblind() -> Self {
        Self {
            apply_ready: Color::Rgb(0x00, 0x80, 0xFF),
            load_error: Color::Rgb(0xFF, 0x8C, 0x00),
            attention: Color::Rgb(0xFF, 0xD7, 0x00),
            ..Self::dark()
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "dark" => Self::dark(),
            "light" => Self::light(),
            "colorblind" => Self::colorblind(),
            other => {
                tracing::warn!(theme = other, known = ?THEME_NAMES, "unknown theme, using dark");
                Self::dark()
            }
        }
    }
}
