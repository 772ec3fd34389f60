//! Mapping true-color frames onto a palette.
//!
//! # Algorithms
//!
//! - **Nearest**: plain nearest-color lookup
//! - **Bayer**: 8×8 ordered dithering
//! - **Error diffusion**: Floyd–Steinberg, false Floyd–Steinberg, Stucki,
//!   Atkinson, Jarvis–Judice–Ninke, Burkes, Sierra, two-row Sierra and
//!   Sierra Lite, all sharing one row-buffered diffusion loop
//! - **Riemersma**: error history carried along a Hilbert curve
//!
//! All algorithms implement [`Dither`]; [`DitherMode`] selects one by name.
//! Pixels flagged in a [`TransparentPixels`] mask are written as the
//! transparency index and take no part in error propagation.
//!
//! # Example
//!
//! ```
//! use gif_quant::{dither, ColorDistance, DitherMode, DitherOptions, Frame, Palette, Rgba};
//!
//! let palette = Palette::new(&[Rgba::opaque(0, 0, 0), Rgba::opaque(255, 255, 255)]).unwrap();
//! let frame = Frame::filled(2, 2, Rgba::opaque(250, 250, 250)).unwrap();
//! let indices = dither::reduce(
//!     &frame,
//!     &palette,
//!     DitherMode::FloydSteinberg,
//!     &ColorDistance::default(),
//!     &DitherOptions::default(),
//!     None,
//! );
//! assert_eq!(indices, vec![1; 4]);
//! ```

mod diffusion;
mod kernel;
mod options;
mod ordered;
mod riemersma;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::distance::ColorDistance;
use crate::frame::Frame;
use crate::palette::{Palette, PaletteMatcher};

pub use diffusion::{ErrorBuffer, ErrorDiffusion};
pub use kernel::*;
pub use options::DitherOptions;
pub use ordered::Bayer;
pub use riemersma::{hilbert_curve, Riemersma};

/// Dithering algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DitherMode {
    /// Nearest palette color, no dithering
    #[default]
    Nearest,
    /// Ordered dithering with an 8×8 Bayer matrix
    Bayer,
    /// Floyd–Steinberg error diffusion
    FloydSteinberg,
    /// Three-neighbour Floyd–Steinberg approximation
    FalseFloydSteinberg,
    /// Stucki error diffusion
    Stucki,
    /// Atkinson error diffusion (75% propagation)
    Atkinson,
    /// Jarvis–Judice–Ninke error diffusion
    Jarvis,
    /// Burkes error diffusion
    Burkes,
    /// Three-row Sierra error diffusion
    Sierra,
    /// Two-row Sierra error diffusion
    TwoSierra,
    /// Sierra Lite error diffusion
    SierraLite,
    /// Riemersma dithering along a Hilbert curve
    Riemersma,
}

impl DitherMode {
    /// All modes, in declaration order.
    pub const ALL: [DitherMode; 12] = [
        DitherMode::Nearest,
        DitherMode::Bayer,
        DitherMode::FloydSteinberg,
        DitherMode::FalseFloydSteinberg,
        DitherMode::Stucki,
        DitherMode::Atkinson,
        DitherMode::Jarvis,
        DitherMode::Burkes,
        DitherMode::Sierra,
        DitherMode::TwoSierra,
        DitherMode::SierraLite,
        DitherMode::Riemersma,
    ];

    /// The kebab-case name used in configuration files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            DitherMode::Nearest => "nearest",
            DitherMode::Bayer => "bayer",
            DitherMode::FloydSteinberg => "floyd-steinberg",
            DitherMode::FalseFloydSteinberg => "false-floyd-steinberg",
            DitherMode::Stucki => "stucki",
            DitherMode::Atkinson => "atkinson",
            DitherMode::Jarvis => "jarvis",
            DitherMode::Burkes => "burkes",
            DitherMode::Sierra => "sierra",
            DitherMode::TwoSierra => "two-sierra",
            DitherMode::SierraLite => "sierra-lite",
            DitherMode::Riemersma => "riemersma",
        }
    }

    /// Diffusion kernel for the array-kernel modes.
    pub fn kernel(self) -> Option<&'static Kernel> {
        match self {
            DitherMode::FloydSteinberg => Some(&FLOYD_STEINBERG),
            DitherMode::FalseFloydSteinberg => Some(&FALSE_FLOYD_STEINBERG),
            DitherMode::Stucki => Some(&STUCKI),
            DitherMode::Atkinson => Some(&ATKINSON),
            DitherMode::Jarvis => Some(&JARVIS),
            DitherMode::Burkes => Some(&BURKES),
            DitherMode::Sierra => Some(&SIERRA),
            DitherMode::TwoSierra => Some(&TWO_SIERRA),
            DitherMode::SierraLite => Some(&SIERRA_LITE),
            DitherMode::Nearest | DitherMode::Bayer | DitherMode::Riemersma => None,
        }
    }
}

impl fmt::Display for DitherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown dithering mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dithering mode '{0}'")]
pub struct UnknownDitherMode(pub String);

impl FromStr for DitherMode {
    type Err = UnknownDitherMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        let wanted = match wanted.as_str() {
            "none" | "false" | "off" => "nearest",
            "fs" => "floyd-steinberg",
            "jjn" | "jarvis-judice-ninke" => "jarvis",
            "sierra-two-row" | "two-row-sierra" => "two-sierra",
            other => other,
        };
        DitherMode::ALL
            .into_iter()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| UnknownDitherMode(s.to_string()))
    }
}

/// Pixels pinned to a fixed palette index.
///
/// Used for fully transparent pixels: they are written as `index`, their
/// accumulated error is discarded and they diffuse nothing.
#[derive(Debug, Clone, Copy)]
pub struct TransparentPixels<'a> {
    /// One flag per pixel, raster order
    pub mask: &'a [bool],
    /// Palette index written for flagged pixels
    pub index: u8,
}

impl TransparentPixels<'_> {
    #[inline]
    pub(crate) fn index_at(&self, i: usize) -> Option<u8> {
        self.mask.get(i).copied().unwrap_or(false).then_some(self.index)
    }
}

/// A dithering algorithm.
pub trait Dither {
    /// Map every pixel of `frame` to a palette index.
    ///
    /// Returns `width * height` indices in raster order, each below
    /// `palette.len()`.
    fn dither(
        &self,
        frame: &Frame,
        palette: &Palette,
        distance: &ColorDistance,
        options: &DitherOptions,
        transparent: Option<TransparentPixels<'_>>,
    ) -> Vec<u8>;
}

/// Nearest-color mapping without dithering.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nearest;

impl Dither for Nearest {
    fn dither(
        &self,
        frame: &Frame,
        palette: &Palette,
        distance: &ColorDistance,
        _options: &DitherOptions,
        transparent: Option<TransparentPixels<'_>>,
    ) -> Vec<u8> {
        let mut matcher =
            PaletteMatcher::new(palette, *distance).excluding(transparent.map(|t| t.index));
        frame
            .pixels()
            .enumerate()
            .map(|(i, px)| {
                transparent
                    .and_then(|t| t.index_at(i))
                    .unwrap_or_else(|| matcher.nearest(px))
            })
            .collect()
    }
}

/// Reduce `frame` to palette indices with the selected algorithm.
pub fn reduce(
    frame: &Frame,
    palette: &Palette,
    mode: DitherMode,
    distance: &ColorDistance,
    options: &DitherOptions,
    transparent: Option<TransparentPixels<'_>>,
) -> Vec<u8> {
    let indices = match mode {
        DitherMode::Nearest => Nearest.dither(frame, palette, distance, options, transparent),
        DitherMode::Bayer => Bayer.dither(frame, palette, distance, options, transparent),
        DitherMode::Riemersma => Riemersma.dither(frame, palette, distance, options, transparent),
        kernel_mode => match kernel_mode.kernel() {
            Some(kernel) => {
                ErrorDiffusion::new(kernel).dither(frame, palette, distance, options, transparent)
            }
            None => Nearest.dither(frame, palette, distance, options, transparent),
        },
    };
    debug_assert_eq!(indices.len(), frame.pixel_count());
    indices
}
