//! 8-bit RGBA color.

use std::fmt;
use std::str::FromStr;

use crate::palette::ParseColorError;

/// An 8-bit-per-channel color with straight (non-premultiplied) alpha.
///
/// GIF color tables only carry RGB; alpha exists so that transparency can
/// take part in distance calculations and palette building before it is
/// collapsed to a single transparency index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Rgba {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel (255 = opaque)
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    /// Create a color from its four channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color.
    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create an opaque color from a `0xRRGGBB` value. Bits above 24 are ignored.
    ///
    /// # Example
    /// ```
    /// use gif_quant::Rgba;
    /// assert_eq!(Rgba::from_rgb_hex(0x336699), Rgba::opaque(0x33, 0x66, 0x99));
    /// ```
    #[inline]
    pub const fn from_rgb_hex(hex: u32) -> Self {
        Self::opaque((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// The `0xRRGGBB` value of this color, alpha dropped.
    #[inline]
    pub const fn to_rgb_hex(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Pack into `0xAABBGGRR`, the little-endian byte order of an RGBA raster.
    ///
    /// This is the histogram key; ordering by it is part of the
    /// deterministic tie-breaking of the histogram quantizer.
    #[inline]
    pub const fn packed(self) -> u32 {
        (self.a as u32) << 24 | (self.b as u32) << 16 | (self.g as u32) << 8 | self.r as u32
    }

    /// Inverse of [`packed`](Self::packed).
    #[inline]
    pub const fn from_packed(value: u32) -> Self {
        Self::new(value as u8, (value >> 8) as u8, (value >> 16) as u8, (value >> 24) as u8)
    }

    /// Read a pixel from a 4-byte RGBA slice.
    #[inline]
    pub fn from_slice(px: &[u8]) -> Self {
        Self::new(px[0], px[1], px[2], px[3])
    }

    /// The RGB triple.
    #[inline]
    pub const fn rgb(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Channels as floats, in `[r, g, b, a]` order.
    #[inline]
    pub fn channels(self) -> [f64; 4] {
        [self.r as f64, self.g as f64, self.b as f64, self.a as f64]
    }

    /// Build a color from float channels, rounding and clamping to `0..=255`.
    #[inline]
    pub fn from_channels_rounded(c: [f64; 4]) -> Self {
        let q = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Self::new(q(c[0]), q(c[1]), q(c[2]), q(c[3]))
    }

    /// Same color with alpha forced to 255.
    #[inline]
    pub const fn to_opaque(self) -> Self {
        Self::opaque(self.r, self.g, self.b)
    }

    /// BT.709 luma, optionally compositing over white by alpha first.
    pub fn luminosity(self, use_alpha: bool) -> f64 {
        let [mut r, mut g, mut b, a] = self.channels();
        if use_alpha {
            r = (255.0 - a + a * r / 255.0).min(255.0);
            g = (255.0 - a + a * g / 255.0).min(255.0);
            b = (255.0 - a + a * b / 255.0).min(255.0);
        }
        r * 0.2126 + g * 0.7152 + b * 0.0722
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Rgba {
    type Err = ParseColorError;

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` (the hash is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(ParseColorError::NonAscii);
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        match hex.len() {
            3 => {
                let v = u16::from_str_radix(hex, 16)?;
                let expand = |n: u16| ((n & 0xF) * 17) as u8;
                Ok(Self::opaque(expand(v >> 8), expand(v >> 4), expand(v)))
            }
            6 => Ok(Self::opaque(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(ParseColorError::InvalidLength(hex.len())),
        }
    }
}
