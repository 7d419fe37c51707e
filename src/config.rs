use std::fmt;
use std::num::NonZeroUsize;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::color::Color;

pub const DEFAULT_GRID_WIDTH: u32 = 50;
pub const DEFAULT_BEAD_SIZE: u32 = 20;
pub const DEFAULT_GAP: u32 = 2;
pub const DEFAULT_BACKGROUND: Color = Color::new(0x12, 0x12, 0x12);
pub const DEFAULT_GRID_LINE: Color = Color::new(0x33, 0x33, 0x33);

/// Upper bound on the number of distinct colors in the final palette.
///
/// Parsed permissively from user text: `"max"` (any case) is unlimited, a
/// leading integer is a cap (decimal, or hex after `0x`), and anything else
/// falls back to unlimited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ColorLimitRepr", into = "ColorLimitRepr")]
pub enum ColorLimit {
    #[default]
    Max,
    Limit(NonZeroUsize),
}

impl ColorLimit {
    pub fn parse(text: &str) -> Self {
        let text = text.trim().to_ascii_lowercase();
        if text == "max" {
            return ColorLimit::Max;
        }
        match leading_integer(&text) {
            Some(n) if n > 0 => {
                let n = usize::try_from(n).unwrap_or(usize::MAX);
                NonZeroUsize::new(n).map_or(ColorLimit::Max, ColorLimit::Limit)
            }
            _ => {
                warn!("color count {text:?} is not a positive integer, using all colors");
                ColorLimit::Max
            }
        }
    }

    pub fn limit(self) -> Option<usize> {
        match self {
            ColorLimit::Max => None,
            ColorLimit::Limit(n) => Some(n.get()),
        }
    }
}

impl fmt::Display for ColorLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorLimit::Max => f.write_str("max"),
            ColorLimit::Limit(n) => write!(f, "{n}"),
        }
    }
}

/// Integer prefix of `text` (optional sign, optional `0x`, then digits), like
/// a browser's `parseInt` without a radix. Saturates instead of overflowing.
fn leading_integer(text: &str) -> Option<i64> {
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, rest) = match rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        Some(hex) => (16, hex),
        None => (10, rest),
    };
    let digits: Vec<u32> = rest.chars().map_while(|c| c.to_digit(radix)).collect();
    if digits.is_empty() {
        return None;
    }
    let magnitude = digits.iter().fold(0i64, |acc, &d| {
        acc.saturating_mul(radix as i64).saturating_add(d as i64)
    });
    Some(if negative { -magnitude } else { magnitude })
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ColorLimitRepr {
    Count(i64),
    Text(String),
}

impl From<ColorLimitRepr> for ColorLimit {
    fn from(repr: ColorLimitRepr) -> Self {
        match repr {
            ColorLimitRepr::Count(n) => ColorLimit::parse(&n.to_string()),
            ColorLimitRepr::Text(text) => ColorLimit::parse(&text),
        }
    }
}

impl From<ColorLimit> for ColorLimitRepr {
    fn from(limit: ColorLimit) -> Self {
        match limit {
            ColorLimit::Max => ColorLimitRepr::Text("max".to_string()),
            ColorLimit::Limit(n) => ColorLimitRepr::Count(n.get() as i64),
        }
    }
}

/// Bead geometry and surface colors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeadStyle {
    /// Side of one grid cell on the output surface, in pixels.
    pub bead_size: u32,
    /// Space between neighbouring beads, in pixels.
    pub gap: u32,
    pub background: Color,
    pub grid_line: Color,
}

impl Default for BeadStyle {
    fn default() -> Self {
        Self {
            bead_size: DEFAULT_BEAD_SIZE,
            gap: DEFAULT_GAP,
            background: DEFAULT_BACKGROUND,
            grid_line: DEFAULT_GRID_LINE,
        }
    }
}

/// Settings for one render pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub grid_width: u32,
    pub show_grid: bool,
    pub color_limit: ColorLimit,
    /// Posterize channels before counting colors.
    pub no_gradient: bool,
    pub style: BeadStyle,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            grid_width: DEFAULT_GRID_WIDTH,
            show_grid: true,
            color_limit: ColorLimit::Max,
            no_gradient: false,
            style: BeadStyle::default(),
        }
    }
}

impl RenderConfig {
    /// Clamp values the pipeline cannot use: a zero grid width or bead size becomes 1.
    pub fn normalized(mut self) -> Self {
        if self.grid_width == 0 {
            warn!("grid width 0 is invalid, using 1");
            self.grid_width = 1;
        }
        if self.style.bead_size == 0 {
            warn!("bead size 0 is invalid, using 1");
            self.style.bead_size = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(n: usize) -> ColorLimit {
        ColorLimit::Limit(NonZeroUsize::new(n).unwrap())
    }

    #[test]
    fn parses_max_in_any_case() {
        assert_eq!(ColorLimit::parse("max"), ColorLimit::Max);
        assert_eq!(ColorLimit::parse("  MAX "), ColorLimit::Max);
    }

    #[test]
    fn parses_leading_integer() {
        assert_eq!(ColorLimit::parse("3"), limit(3));
        assert_eq!(ColorLimit::parse(" 16 "), limit(16));
        assert_eq!(ColorLimit::parse("12 colors"), limit(12));
        assert_eq!(ColorLimit::parse("+7"), limit(7));
    }

    #[test]
    fn parses_hex_prefix_like_parse_int() {
        assert_eq!(ColorLimit::parse("0x10"), limit(16));
        assert_eq!(ColorLimit::parse("0XfF"), limit(255));
        assert_eq!(ColorLimit::parse("0x"), ColorLimit::Max);
        assert_eq!(ColorLimit::parse("-0x3"), ColorLimit::Max);
    }

    #[test]
    fn unparseable_falls_back_to_unlimited() {
        for text in ["", "lots", "x12", "0", "-4", "-"] {
            assert_eq!(ColorLimit::parse(text), ColorLimit::Max, "{text:?}");
        }
    }

    #[test]
    fn deserializes_text_or_number() {
        let cfg: RenderConfig =
            serde_json::from_str(r#"{"grid_width": 30, "color_limit": 8}"#).unwrap();
        assert_eq!(cfg.grid_width, 30);
        assert_eq!(cfg.color_limit, limit(8));
        assert!(cfg.show_grid);
        assert_eq!(cfg.style, BeadStyle::default());

        let cfg: RenderConfig = serde_json::from_str(r#"{"color_limit": "Max"}"#).unwrap();
        assert_eq!(cfg.color_limit, ColorLimit::Max);
    }

    #[test]
    fn serializes_round_trip() {
        let cfg = RenderConfig {
            color_limit: limit(5),
            no_gradient: true,
            ..RenderConfig::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"background\":\"#121212\""));
        let back: RenderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn normalized_clamps_zero_sizes() {
        let cfg = RenderConfig {
            grid_width: 0,
            style: BeadStyle {
                bead_size: 0,
                ..BeadStyle::default()
            },
            ..RenderConfig::default()
        }
        .normalized();
        assert_eq!(cfg.grid_width, 1);
        assert_eq!(cfg.style.bead_size, 1);
    }
}
