//! Packed RGB colors and their `#RRGGBB` text form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BeadError;

/// Posterize step: channels snap to multiples of this value.
const POSTERIZE_STEP: u16 = 32;

/// An opaque 8-bit RGB color. Alpha never takes part in color accounting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        rgb_to_hex(self.r, self.g, self.b)
    }

    pub fn from_hex(hex: &str) -> Result<Self, BeadError> {
        let (r, g, b) = hex_to_rgb(hex)?;
        Ok(Self::new(r, g, b))
    }

    /// Squared Euclidean distance in RGB space.
    pub fn distance_sq(self, other: Color) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    /// Perceptual brightness with Rec. 601 luma weights, in `0.0..=255.0`.
    pub fn brightness(self) -> f32 {
        self.luma_key() as f32 / 1000.0
    }

    /// Integer form of [`Color::brightness`] scaled by 1000, used for exact ordering.
    pub(crate) fn luma_key(self) -> u32 {
        299 * self.r as u32 + 587 * self.g as u32 + 114 * self.b as u32
    }

    /// Snap every channel to the nearest multiple of 32, clamped to 255.
    pub fn posterize(self) -> Self {
        Self::new(
            posterize_channel(self.r),
            posterize_channel(self.g),
            posterize_channel(self.b),
        )
    }
}

/// Round a channel to the nearest multiple of 32 (halves round up), clamped to 255.
///
/// Yields one of nine levels: 0, 32, .., 224, 255.
pub fn posterize_channel(value: u8) -> u8 {
    let level = (value as u16 + POSTERIZE_STEP / 2) / POSTERIZE_STEP;
    (level * POSTERIZE_STEP).min(255) as u8
}

/// Encode three channels as `#RRGGBB`, uppercase and zero padded.
pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Parse `#RRGGBB` (the `#` is optional) back into channels.
pub fn hex_to_rgb(hex: &str) -> Result<(u8, u8, u8), BeadError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    // `from_str_radix` tolerates a sign, so validate the digits up front.
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(BeadError::InvalidColorFormat(hex.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| BeadError::InvalidColorFormat(hex.to_string()))
    };
    Ok((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = BeadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl TryFrom<String> for Color {
    type Error = BeadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_conversion() {
        assert_eq!(rgb_to_hex(255, 0, 0), "#FF0000");
        assert_eq!(rgb_to_hex(1, 2, 3), "#010203");
        assert_eq!(rgb_to_hex(255, 128, 0), "#FF8000");
        assert_eq!(hex_to_rgb("#00FF00").unwrap(), (0, 255, 0));
        assert_eq!(hex_to_rgb("0000ff").unwrap(), (0, 0, 255));
    }

    #[test]
    fn hex_round_trip_over_channel_space() {
        for r in (0..=255u8).step_by(15) {
            for g in (0..=255u8).step_by(17) {
                for b in [0u8, 1, 127, 128, 254, 255] {
                    assert_eq!(hex_to_rgb(&rgb_to_hex(r, g, b)).unwrap(), (r, g, b));
                }
            }
        }
    }

    #[test]
    fn malformed_hex_is_rejected() {
        for bad in ["", "#", "#FFF", "#FF00000", "#GG0000", "#+F0000", "FF 000", "#ÿÿÿ"] {
            assert!(
                matches!(hex_to_rgb(bad), Err(BeadError::InvalidColorFormat(_))),
                "{bad:?} should fail"
            );
        }
    }

    #[test]
    fn posterize_levels() {
        assert_eq!(posterize_channel(0), 0);
        assert_eq!(posterize_channel(15), 0);
        assert_eq!(posterize_channel(16), 32);
        assert_eq!(posterize_channel(100), 96);
        assert_eq!(posterize_channel(239), 224);
        assert_eq!(posterize_channel(240), 255);
        assert_eq!(posterize_channel(255), 255);
    }

    #[test]
    fn posterize_is_idempotent() {
        for v in 0..=255u8 {
            let once = posterize_channel(v);
            assert_eq!(posterize_channel(once), once);
        }
    }

    #[test]
    fn brightness_uses_luma_weights() {
        assert_eq!(Color::new(255, 255, 255).brightness(), 255.0);
        assert!(Color::new(0, 255, 0).brightness() > Color::new(255, 0, 0).brightness());
        assert!(Color::new(255, 0, 0).brightness() > Color::new(0, 0, 255).brightness());
    }

    #[test]
    fn serde_uses_hex_text() {
        let json = serde_json::to_string(&Color::new(18, 18, 18)).unwrap();
        assert_eq!(json, "\"#121212\"");
        let back: Color = serde_json::from_str("\"#333333\"").unwrap();
        assert_eq!(back, Color::new(0x33, 0x33, 0x33));
        assert!(serde_json::from_str::<Color>("\"nope\"").is_err());
    }
}
