//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use crate::grid::MAX_COLORS;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// One Dark palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Chip colours by index: red, teal, yellow, purple, green, blue.
    /// Blue is the level objective on a full board.
    pub chips: [Color; MAX_COLORS as usize],
    /// Bomb body.
    pub bomb: Color,
    /// Bomb fuse, flash highlight and blast glow.
    pub spark: Color,
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, level).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

const ONEDARK_CHIPS: [Color; 6] = [
    Color::from_u32(0xE06C75), // cpu_end / red
    Color::from_u32(0x56B6C2), // hi_fg / teal
    Color::from_u32(0xE5C07B), // title / yellow
    Color::from_u32(0xC678DD), // net_box / purple
    Color::from_u32(0x98C379), // mem_box / green
    Color::from_u32(0x61AFEF), // cpu_box / blue
];

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    pub fn onedark_default() -> Self {
        Self {
            chips: ONEDARK_CHIPS,
            bomb: Color::from_u32(0xBE5046),
            spark: Color::from_u32(0xFFCC00),
            bg: Color::from_u32(0x282C34),
            div_line: Color::from_u32(0x3F444F),
            main_fg: Color::from_u32(0xABB2BF),
            title: Color::from_u32(0xE5C07B),
            inactive_fg: Color::from_u32(0x5C6370),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))
            }
            _ => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override chip colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.chips = [
                    Color::from_u32(0xFF0000),
                    Color::from_u32(0x00FFFF),
                    Color::from_u32(0xFFFF00),
                    Color::from_u32(0xFF00FF),
                    Color::from_u32(0x00FF00),
                    Color::from_u32(0x0088FF),
                ];
                self.bomb = Color::from_u32(0xFFFFFF);
            }
            Palette::Colorblind => {
                // Paul Tol's "bright" scheme.
                self.chips = [
                    Color::from_u32(0xEE6677),
                    Color::from_u32(0x66CCEE),
                    Color::from_u32(0xCCBB44),
                    Color::from_u32(0xAA3377),
                    Color::from_u32(0x228833),
                    Color::from_u32(0x4477AA),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let d = Self::onedark_default();
        Self {
            chips: [
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(d.chips[0]),
                get("hi_fg").or_else(|| get("proc_misc")).unwrap_or(d.chips[1]),
                get("cpu_mid").or_else(|| get("title")).unwrap_or(d.chips[2]),
                get("net_box").unwrap_or(d.chips[3]),
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(d.chips[4]),
                get("cpu_box").unwrap_or(d.chips[5]),
            ],
            bomb: get("temp_end").unwrap_or(d.bomb),
            spark: get("hi_fg").unwrap_or(d.spark),
            bg: get("main_bg").or_else(|| get("meter_bg")).unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
        }
    }

    #[inline]
    pub fn chip_color(&self, index: u8) -> Color {
        self.chips[index as usize % self.chips.len()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let digits = u32::from_str_radix(s, 16).map_err(|_| invalid())?;
    match s.len() {
        6 => Ok(Color::from_u32(digits)),
        3 => {
            let nibble = |shift: u32| ((digits >> shift) & 0xF) as u8 * 17;
            Ok(Color::Rgb(nibble(8), nibble(4), nibble(0)))
        }
        _ => Err(invalid()),
    }
}
