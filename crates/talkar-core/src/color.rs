use serde::{Deserialize, Serialize};
use std::fmt;

/// RGBA color representation with f32 components in [0.0, 1.0] range.
///
/// Experience documents author colors two ways: as 0–255 RGB triples on
/// `color` properties and animations, and as bare hex strings (`"BBB"`,
/// `"FFFFFF"`) on lights and the call-to-action button. Both end up here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Create a new RGBA color.
    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color (alpha = 1.0).
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create an opaque color from 0–255 channel values, as authored on
    /// `color` properties. Out-of-range channels are clamped.
    pub fn from_rgb255(r: f64, g: f64, b: f64) -> Self {
        let channel = |v: f64| (v.clamp(0.0, 255.0) / 255.0) as f32;
        Self::rgb(channel(r), channel(g), channel(b))
    }

    /// Create a color from a hex string: `#RGB`, `#RRGGBB` or `#RRGGBBAA`,
    /// with or without the leading `#`.
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(ColorError::InvalidHex);
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| ColorError::InvalidHex);
        match hex.len() {
            3 => {
                let mut channels = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16).ok_or(ColorError::InvalidHex)? as u8;
                    channels[i] = v * 17;
                }
                Ok(Self::rgb(
                    channels[0] as f32 / 255.0,
                    channels[1] as f32 / 255.0,
                    channels[2] as f32 / 255.0,
                ))
            }
            6 => {
                let r = byte(&hex[0..2])?;
                let g = byte(&hex[2..4])?;
                let b = byte(&hex[4..6])?;
                Ok(Self::rgb(
                    r as f32 / 255.0,
                    g as f32 / 255.0,
                    b as f32 / 255.0,
                ))
            }
            8 => {
                let r = byte(&hex[0..2])?;
                let g = byte(&hex[2..4])?;
                let b = byte(&hex[4..6])?;
                let a = byte(&hex[6..8])?;
                Ok(Self::rgba(
                    r as f32 / 255.0,
                    g as f32 / 255.0,
                    b as f32 / 255.0,
                    a as f32 / 255.0,
                ))
            }
            _ => Err(ColorError::InvalidHex),
        }
    }

    /// Convert to RGBA u8 tuple.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            (self.r * 255.0).round().clamp(0.0, 255.0) as u8,
            (self.g * 255.0).round().clamp(0.0, 255.0) as u8,
            (self.b * 255.0).round().clamp(0.0, 255.0) as u8,
            (self.a * 255.0).round().clamp(0.0, 255.0) as u8,
        ]
    }

    // --- Named constants ---

    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    /// Fallback tint for particle emitters (`#808080`).
    pub const GREY: Color = Color {
        r: 128.0 / 255.0,
        g: 128.0 / 255.0,
        b: 128.0 / 255.0,
        a: 1.0,
    };
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ColorError {
    #[error("invalid hex color string")]
    InvalidHex,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_rgb255_extremes() {
        assert_eq!(Color::from_rgb255(255.0, 255.0, 255.0), Color::WHITE);
        assert_eq!(Color::from_rgb255(0.0, 0.0, 0.0), Color::BLACK);
        assert_eq!(format!("{}", Color::from_rgb255(255.0, 255.0, 255.0)), "#ffffff");
        assert_eq!(format!("{}", Color::from_rgb255(0.0, 0.0, 0.0)), "#000000");
    }

    #[test]
    fn test_color_from_rgb255_clamps() {
        let c = Color::from_rgb255(300.0, -4.0, 128.0);
        assert_eq!(c.to_rgba8(), [255, 0, 128, 255]);
    }

    #[test]
    fn test_color_from_short_hex() {
        let c = Color::from_hex("BBB").unwrap();
        assert_eq!(c.to_rgba8(), [187, 187, 187, 255]);
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::WHITE);
    }

    #[test]
    fn test_color_from_hex_rgb() {
        let c = Color::from_hex("#FF8800").unwrap();
        assert_eq!(c.to_rgba8(), [255, 136, 0, 255]);
    }

    #[test]
    fn test_color_from_hex_rgba() {
        let c = Color::from_hex("#FF880080").unwrap();
        assert_eq!(c.to_rgba8(), [255, 136, 0, 128]);
    }

    #[test]
    fn test_color_from_hex_invalid() {
        assert!(Color::from_hex("invalid").is_err());
        assert!(Color::from_hex("#GG0000").is_err());
        assert!(Color::from_hex("#GGG").is_err());
    }

    #[test]
    fn test_color_from_hex_non_ascii() {
        assert!(Color::from_hex("aébcd").is_err());
        assert!(Color::from_hex("#ffé0ff").is_err());
        assert!(Color::from_hex("ab€").is_err());
    }

    #[test]
    fn test_grey_matches_hex() {
        assert_eq!(Color::GREY.to_rgba8(), Color::from_hex("808080").unwrap().to_rgba8());
    }
}
