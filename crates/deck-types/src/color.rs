use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Errors that can occur when parsing colour values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ColorError {
    /// The input was not a six digit hex colour, with or without a leading `#`.
    #[error("invalid hex colour: {0}")]
    InvalidHex(String),
}

/// An 8-bit-per-channel RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Encodes the colour as `#RRGGBB` with uppercase hex digits.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Parses `#RRGGBB` or `RRGGBB` (either case).
    pub fn from_hex(input: &str) -> Result<Self, ColorError> {
        let digits = input.strip_prefix('#').unwrap_or(input);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidHex(input.to_owned()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| ColorError::InvalidHex(input.to_owned()))
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// WCAG 2.x relative luminance in `0.0..=1.0`.
    pub fn relative_luminance(&self) -> f64 {
        fn linearise(channel: u8) -> f64 {
            let c = f64::from(channel) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }

        0.2126 * linearise(self.r) + 0.7152 * linearise(self.g) + 0.0722 * linearise(self.b)
    }

    /// WCAG contrast ratio between two colours, in `1.0..=21.0`.
    pub fn contrast_ratio(&self, other: &Rgb) -> f64 {
        let a = self.relative_luminance();
        let b = other.relative_luminance();
        let (lighter, darker) = if a >= b { (a, b) } else { (b, a) };
        (lighter + 0.05) / (darker + 0.05)
    }

    /// Per-channel 255 complement.
    pub fn complement(&self) -> Rgb {
        Rgb::new(255 - self.r, 255 - self.g, 255 - self.b)
    }

    /// Adds `offset` to every channel, saturating at 255.
    pub fn lighten(&self, offset: u8) -> Rgb {
        Rgb::new(
            self.r.saturating_add(offset),
            self.g.saturating_add(offset),
            self.b.saturating_add(offset),
        )
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Five-colour brand palette, each entry encoded as `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BrandColors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_hex_is_uppercase_and_zero_padded() {
        assert_eq!(Rgb::new(0, 10, 255).to_hex(), "#000AFF");
    }

    #[test]
    fn test_from_hex_accepts_both_prefix_forms() {
        assert_eq!(Rgb::from_hex("#4287f5").expect("hex"), Rgb::new(66, 135, 245));
        assert_eq!(Rgb::from_hex("4287F5").expect("hex"), Rgb::new(66, 135, 245));
    }

    #[test]
    fn test_from_hex_rejects_malformed_input() {
        assert!(matches!(Rgb::from_hex("#12345"), Err(ColorError::InvalidHex(_))));
        assert!(matches!(Rgb::from_hex("#GGGGGG"), Err(ColorError::InvalidHex(_))));
    }

    #[test]
    fn test_contrast_ratio_black_on_white_is_maximal() {
        let ratio = Rgb::new(0, 0, 0).contrast_ratio(&Rgb::new(255, 255, 255));
        assert!((ratio - 21.0).abs() < 1e-9);
        let same = Rgb::new(90, 90, 90).contrast_ratio(&Rgb::new(90, 90, 90));
        assert!((same - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_lighten_saturates() {
        assert_eq!(Rgb::new(230, 10, 255).lighten(40), Rgb::new(255, 50, 255));
    }
}
