//! Hex color codec
//!
//! Converts between `#RRGGBB` text and [`Rgb`] triples. Input is
//! case-insensitive and the leading `#` is optional; output is always
//! uppercase and zero-padded.

use crate::error::{Result, SilhouetteError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as an array in R, G, B order
    #[must_use]
    pub const fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Parse hex color text, falling back to black when it does not match
///
/// Never fails, so a bad value can not block rendering.
///
/// # Examples
/// ```rust
/// use imgly_silhouette::color::{parse_hex, Rgb};
///
/// assert_eq!(parse_hex("#ff0080"), Rgb::new(255, 0, 128));
/// assert_eq!(parse_hex("abc123"), Rgb::new(0xAB, 0xC1, 0x23));
/// assert_eq!(parse_hex("zzzzzz"), Rgb::BLACK);
/// ```
#[must_use]
pub fn parse_hex(text: &str) -> Rgb {
    try_parse_hex(text).unwrap_or(Rgb::BLACK)
}

/// Parse hex color text strictly
///
/// Accepts an optional leading `#` followed by exactly six hex digits.
///
/// # Errors
/// - `SilhouetteError::InvalidColorText` when the text does not match
pub fn try_parse_hex(text: &str) -> Result<Rgb> {
    let digits = text.strip_prefix('#').unwrap_or(text);

    // `from_str_radix` tolerates a leading `+`, so check the digits first
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SilhouetteError::invalid_color_text(text));
    }

    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .ok_or_else(|| SilhouetteError::invalid_color_text(text))
    };

    Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Format a color as uppercase `#RRGGBB`
#[must_use]
pub fn format_hex(color: Rgb) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r, color.g, color.b)
}

/// Normalize free-text hex input the way the hex field does
///
/// Prepends `#` when missing, then validates. Whitespace is not stripped.
///
/// # Errors
/// - `SilhouetteError::InvalidColorText` when the normalized text does not match
pub fn normalize_hex_input(text: &str) -> Result<Rgb> {
    if text.starts_with('#') {
        try_parse_hex(text)
    } else {
        try_parse_hex(&format!("#{}", text))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_hex(*self))
    }
}

impl FromStr for Rgb {
    type Err = SilhouetteError;

    fn from_str(s: &str) -> Result<Self> {
        try_parse_hex(s)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_hex(*self))
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        try_parse_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// A color value arriving from one of the two input surfaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorInput {
    /// Value from a color picker, already `#RRGGBB`
    Picker(String),
    /// Free text typed into the hex field
    HexText(String),
}
