//! Colours and WCAG contrast
//!
//! Values are parsed with lightningcss, so every CSS colour syntax it knows
//! (hex, `rgb()`, `hsl()`, `hwb()`, `lab()`, `color()`, named colours) is
//! reduced to sRGB before the contrast math runs.

use lightningcss::traits::Parse;
use lightningcss::values::color::CssColor;
use std::fmt;

/// sRGB colour with straight alpha
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Alpha in `0.0..=1.0`
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS colour value
    ///
    /// `currentColor` has no value of its own and yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let color = CssColor::parse_string(value.trim()).ok()?;
        Self::from_css(&color)
    }

    /// Convert a lightningcss colour to sRGB
    pub fn from_css(color: &CssColor) -> Option<Self> {
        match color {
            CssColor::CurrentColor => None,
            CssColor::RGBA(rgba) => Some(Color::rgba(rgba.red, rgba.green, rgba.blue, rgba.alpha_f32())),
            other => match other.to_rgb() {
                Ok(CssColor::RGBA(rgba)) => Some(Color::rgba(rgba.red, rgba.green, rgba.blue, rgba.alpha_f32())),
                _ => None,
            },
        }
    }

    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    #[inline]
    pub fn is_opaque(&self) -> bool {
        self.a >= 1.0
    }

    /// Composite this colour over `backdrop` (source-over)
    pub fn over(self, backdrop: Color) -> Color {
        if self.is_opaque() {
            return self;
        }
        let a = self.a + backdrop.a * (1.0 - self.a);
        if a <= 0.0 {
            return Color::TRANSPARENT;
        }
        let blend = |src: u8, dst: u8| -> u8 {
            let c = (src as f32 * self.a + dst as f32 * backdrop.a * (1.0 - self.a)) / a;
            c.round().clamp(0.0, 255.0) as u8
        };
        Color {
            r: blend(self.r, backdrop.r),
            g: blend(self.g, backdrop.g),
            b: blend(self.b, backdrop.b),
            a,
        }
    }

    /// WCAG relative luminance (alpha ignored)
    pub fn relative_luminance(&self) -> f64 {
        ContrastChecker::luminance(self.r, self.g, self.b)
    }

    /// WCAG contrast ratio between two colours, in `1.0..=21.0`
    pub fn contrast_ratio(&self, other: &Color) -> f64 {
        ContrastChecker::contrast_ratio(self.relative_luminance(), other.relative_luminance())
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_opaque() {
            write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }
}

/// WCAG 2.x contrast math
pub struct ContrastChecker;

impl ContrastChecker {
    /// Large text: at least 24px, or at least 18.66px (14pt) when bold
    pub const LARGE_TEXT_PX: f32 = 24.0;
    pub const LARGE_BOLD_TEXT_PX: f32 = 18.66;

    /// Relative luminance from sRGB channels
    pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
        fn channel(c: u8) -> f64 {
            let c = c as f64 / 255.0;
            if c <= 0.03928 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
        }
        0.2126 * channel(r) + 0.7152 * channel(g) + 0.0722 * channel(b)
    }

    /// Contrast ratio between two luminances
    pub fn contrast_ratio(l1: f64, l2: f64) -> f64 {
        let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
        (lighter + 0.05) / (darker + 0.05)
    }

    /// Whether text at this size and weight counts as large
    pub fn is_large_text(font_size_px: f32, bold: bool) -> bool {
        font_size_px >= Self::LARGE_TEXT_PX || (bold && font_size_px >= Self::LARGE_BOLD_TEXT_PX)
    }

    /// Check if contrast meets WCAG AA (4.5:1 for normal text)
    pub fn meets_aa(ratio: f64, large_text: bool) -> bool {
        if large_text { ratio >= 3.0 } else { ratio >= 4.5 }
    }

    /// Check if contrast meets WCAG AAA (7:1 for normal text)
    pub fn meets_aaa(ratio: f64, large_text: bool) -> bool {
        if large_text { ratio >= 4.5 } else { ratio >= 7.0 }
    }
}
