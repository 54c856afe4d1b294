// SPDX-License-Identifier: MIT
//
// n-color color type — opaque 8-bit sRGB, hex in and hex out.
//
// Token documents are authored in hex and the rendering surface consumes
// hex, so the canonical form of a color is `#rrggbb` (lower-case). Short
// `#rgb` input is accepted and expanded. Alpha-carrying hex (`#rgba`,
// `#rrggbbaa`) is rejected: a token color is always exactly one opaque
// value per ramp level.
//
// Single-character channel names (r, g, b) follow the usual color-science
// convention.
#![allow(clippy::many_single_char_names)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─── Color ───────────────────────────────────────────────────────────────────

/// An opaque sRGB color with 8 bits per channel.
///
/// # Examples
///
/// ```
/// use n_color::Color;
///
/// let salmon = Color::hex("#fa8072").unwrap();
/// assert_eq!(salmon.to_hex(), "#fa8072");
///
/// // 50% white over black lands on mid gray.
/// let mid = Color::WHITE.blend_over(Color::BLACK, 0.5);
/// assert_eq!(mid.to_hex(), "#808080");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Pure black, `#000000`.
    pub const BLACK: Self = Self::rgb8(0, 0, 0);

    /// Pure white, `#ffffff`.
    pub const WHITE: Self = Self::rgb8(255, 255, 255);

    // ─── Constructors ────────────────────────────────────────────────────

    /// Create a color from 8-bit sRGB channels.
    #[inline]
    #[must_use]
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a color from sRGB channels in the 0.0–1.0 range.
    ///
    /// Out-of-range channels are clamped.
    #[must_use]
    pub fn srgb(r: f64, g: f64, b: f64) -> Self {
        Self::rgb8(to_u8(r), to_u8(g), to_u8(b))
    }

    /// Parse a hex color: `#rgb` or `#rrggbb`, the `#` is optional.
    ///
    /// Returns `None` for anything else, including alpha forms.
    #[must_use]
    pub fn hex(s: &str) -> Option<Self> {
        parse_hex(s.trim())
    }

    // ─── Conversions ─────────────────────────────────────────────────────

    /// Channels as sRGB floats in 0.0–1.0.
    #[must_use]
    pub fn to_srgb(self) -> (f64, f64, f64) {
        (
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        )
    }

    /// Canonical `#rrggbb` form.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    // ─── Compositing ─────────────────────────────────────────────────────

    /// Composite `self` over `bg` at `opacity`.
    ///
    /// Each channel is interpolated independently:
    /// `out = fg * opacity + bg * (1 - opacity)`, rounded to the nearest
    /// 8-bit value. This is what `color-mix(in srgb, …)` produces on the
    /// rendering surface, so a blended token pair measures the same here as
    /// it renders there.
    ///
    /// `opacity` is clamped to `[0, 1]`; NaN is treated as fully opaque.
    #[must_use]
    pub fn blend_over(self, bg: Self, opacity: f64) -> Self {
        let a = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
        if a >= 1.0 {
            return self;
        }
        if a <= 0.0 {
            return bg;
        }
        let mix = |f: u8, b: u8| -> u8 {
            let v = f64::from(f).mul_add(a, f64::from(b) * (1.0 - a));
            round_u8(v)
        };
        Self::rgb8(mix(self.r, bg.r), mix(self.g, bg.g), mix(self.b, bg.b))
    }
}

/// Free-function form of [`Color::blend_over`].
#[must_use]
pub fn blend(fg: Color, bg: Color, opacity: f64) -> Color {
    fg.blend_over(bg, opacity)
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color({})", self.to_hex())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Error returned when a string is not a valid token color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color: {0:?}")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::hex(s).ok_or_else(|| ParseColorError(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

// ─── Hex Parsing ─────────────────────────────────────────────────────────────

fn parse_hex(s: &str) -> Option<Color> {
    let s = s.strip_prefix('#').unwrap_or(s);
    let bytes = s.as_bytes();

    match bytes.len() {
        // #RGB
        3 => {
            let r = parse_hex_digit(bytes[0])?;
            let g = parse_hex_digit(bytes[1])?;
            let b = parse_hex_digit(bytes[2])?;
            Some(Color::rgb8(r << 4 | r, g << 4 | g, b << 4 | b))
        }
        // #RRGGBB
        6 => {
            let r = parse_hex_byte(&bytes[0..2])?;
            let g = parse_hex_byte(&bytes[2..4])?;
            let b = parse_hex_byte(&bytes[4..6])?;
            Some(Color::rgb8(r, g, b))
        }
        _ => None,
    }
}

#[inline]
const fn parse_hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[inline]
fn parse_hex_byte(bytes: &[u8]) -> Option<u8> {
    let hi = parse_hex_digit(bytes[0])?;
    let lo = parse_hex_digit(bytes[1])?;
    Some(hi << 4 | lo)
}

/// Convert a float (0.0–1.0) to a u8 (0–255) with correct rounding.
#[inline]
fn to_u8(v: f64) -> u8 {
    round_u8(v.clamp(0.0, 1.0) * 255.0)
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_u8(v: f64) -> u8 {
    // Safe: clamp guarantees 0.0 <= value <= 255.0 before truncation.
    (v + 0.5).clamp(0.0, 255.0) as u8
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── Hex ─────────────────────────────────────────────────────────

    #[test]
    fn hex_long_form() {
        let c = Color::hex("#fa8072").unwrap();
        assert_eq!((c.r, c.g, c.b), (0xfa, 0x80, 0x72));
    }

    #[test]
    fn hex_without_hash() {
        assert_eq!(Color::hex("808080"), Some(Color::rgb8(128, 128, 128)));
    }

    #[test]
    fn hex_short_form_expands() {
        assert_eq!(Color::hex("#fff"), Some(Color::WHITE));
        assert_eq!(Color::hex("#0a0").unwrap().to_hex(), "#00aa00");
    }

    #[test]
    fn hex_upper_case_normalizes() {
        assert_eq!(Color::hex("#ABCDEF").unwrap().to_hex(), "#abcdef");
    }

    #[test]
    fn hex_rejects_alpha_forms() {
        assert_eq!(Color::hex("#ffff"), None);
        assert_eq!(Color::hex("#ffffff80"), None);
    }

    #[test]
    fn hex_rejects_garbage() {
        assert_eq!(Color::hex(""), None);
        assert_eq!(Color::hex("#ggg"), None);
        assert_eq!(Color::hex("red"), None);
        assert_eq!(Color::hex("#12345"), None);
    }

    #[test]
    fn from_str_reports_input() {
        let err = "nope".parse::<Color>().unwrap_err();
        assert_eq!(err, ParseColorError("nope".to_string()));
        assert_eq!(err.to_string(), r#"invalid hex color: "nope""#);
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn serde_uses_hex_strings() {
        let json = serde_json::to_string(&Color::rgb8(1, 2, 3)).unwrap();
        assert_eq!(json, "\"#010203\"");
        let back: Color = serde_json::from_str("\"#FF0000\"").unwrap();
        assert_eq!(back, Color::rgb8(255, 0, 0));
        assert!(serde_json::from_str::<Color>("\"#zz0000\"").is_err());
    }

    #[test]
    fn srgb_clamps() {
        assert_eq!(Color::srgb(2.0, -1.0, 0.5), Color::rgb8(255, 0, 128));
    }

    // ── Blend ───────────────────────────────────────────────────────

    #[test]
    fn blend_opaque_is_foreground() {
        let fg = Color::rgb8(10, 20, 30);
        assert_eq!(fg.blend_over(Color::WHITE, 1.0), fg);
    }

    #[test]
    fn blend_transparent_is_background() {
        let fg = Color::rgb8(10, 20, 30);
        assert_eq!(fg.blend_over(Color::WHITE, 0.0), Color::WHITE);
    }

    #[test]
    fn blend_half_is_midpoint() {
        assert_eq!(Color::WHITE.blend_over(Color::BLACK, 0.5).to_hex(), "#808080");
    }

    #[test]
    fn blend_clamps_opacity() {
        let fg = Color::rgb8(200, 100, 50);
        assert_eq!(fg.blend_over(Color::BLACK, 3.0), fg);
        assert_eq!(fg.blend_over(Color::BLACK, -1.0), Color::BLACK);
        assert_eq!(fg.blend_over(Color::BLACK, f64::NAN), fg);
    }

    #[test]
    fn blend_is_per_channel() {
        let fg = Color::rgb8(255, 0, 100);
        let bg = Color::rgb8(0, 255, 100);
        assert_eq!(blend(fg, bg, 0.25), Color::rgb8(64, 191, 100));
    }
}
