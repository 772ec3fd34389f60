//! Palette builders.
//!
//! A [`Quantizer`] accumulates statistics from one or more frames with
//! [`Quantizer::sample`] and then produces a [`Palette`] with
//! [`Quantizer::build_palette`]. Three strategies are available:
//!
//! - [`NeuQuant`]: Kohonen-style competitive learning (Dekker 1994)
//! - [`WuQuant`]: greedy variance-minimizing box splitting (Wu 1991)
//! - [`RgbQuant`]: histogram reduction with hue-group guarantees
//!
//! Identical samples, metric and target always give an identical palette.

mod histogram;
mod neuquant;
mod rgbquant;
mod wu;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Rgba;
use crate::distance::ColorDistance;
use crate::frame::Frame;
use crate::palette::{Palette, PaletteError, MAX_PALETTE_SIZE};

pub use histogram::HistogramMethod;
pub use neuquant::NeuQuant;
pub use rgbquant::RgbQuant;
pub use wu::WuQuant;

/// Errors raised while building a palette.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantizeError {
    /// `build_palette` was called before any pixels were sampled
    #[error("no pixels were sampled")]
    EmptySample,
    /// Target color count outside `2..=256`
    #[error("target color count {0} is outside 2..=256")]
    InvalidColorCount(usize),
    /// The resulting colors could not form a palette
    #[error(transparent)]
    Palette(#[from] PaletteError),
}

/// Strategy selector, as used in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuantizerKind {
    /// Neural network quantizer
    #[serde(rename = "neuquant", alias = "neu-quant")]
    NeuQuant,
    /// Wu's box-splitting quantizer
    #[default]
    Wu,
    /// Histogram quantizer with spatial sampling
    #[serde(rename = "rgbquant", alias = "rgb-quant")]
    RgbQuant,
}

impl QuantizerKind {
    /// The kebab-case name used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            QuantizerKind::NeuQuant => "neuquant",
            QuantizerKind::Wu => "wu",
            QuantizerKind::RgbQuant => "rgbquant",
        }
    }
}

impl fmt::Display for QuantizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown quantizer name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown quantizer '{0}' (expected neuquant, wu or rgbquant)")]
pub struct UnknownQuantizer(pub String);

impl FromStr for QuantizerKind {
    type Err = UnknownQuantizer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "neuquant" => Ok(QuantizerKind::NeuQuant),
            "wu" | "wuquant" => Ok(QuantizerKind::Wu),
            "rgbquant" => Ok(QuantizerKind::RgbQuant),
            _ => Err(UnknownQuantizer(s.to_string())),
        }
    }
}

/// A palette builder, dispatched over the available strategies.
#[derive(Debug, Clone)]
pub enum Quantizer {
    NeuQuant(NeuQuant),
    Wu(WuQuant),
    RgbQuant(RgbQuant),
}

impl Quantizer {
    /// Create a builder of the given kind with default tuning.
    pub fn new(kind: QuantizerKind, distance: ColorDistance) -> Self {
        Self::with_histogram(kind, distance, HistogramMethod::default())
    }

    /// Like [`new`](Self::new), choosing the histogram method used by
    /// [`QuantizerKind::RgbQuant`]. Other kinds ignore it.
    pub fn with_histogram(kind: QuantizerKind, distance: ColorDistance, method: HistogramMethod) -> Self {
        match kind {
            QuantizerKind::NeuQuant => Quantizer::NeuQuant(NeuQuant::new(distance)),
            QuantizerKind::Wu => Quantizer::Wu(WuQuant::new(distance)),
            QuantizerKind::RgbQuant => Quantizer::RgbQuant(RgbQuant::new(distance, method)),
        }
    }

    /// Which strategy this is.
    pub fn kind(&self) -> QuantizerKind {
        match self {
            Quantizer::NeuQuant(_) => QuantizerKind::NeuQuant,
            Quantizer::Wu(_) => QuantizerKind::Wu,
            Quantizer::RgbQuant(_) => QuantizerKind::RgbQuant,
        }
    }

    /// Accumulate statistics from `frame`. The frame is not modified.
    pub fn sample(&mut self, frame: &Frame) {
        match self {
            Quantizer::NeuQuant(q) => q.sample(frame),
            Quantizer::Wu(q) => q.sample(frame),
            Quantizer::RgbQuant(q) => q.sample(frame),
        }
    }

    /// The raw quantizer output for `target_colors`: unsorted, possibly
    /// with repeats, not padded.
    pub fn build_colors(&mut self, target_colors: usize) -> Result<Vec<Rgba>, QuantizeError> {
        check_target(target_colors)?;
        match self {
            Quantizer::NeuQuant(q) => q.build_colors(target_colors),
            Quantizer::Wu(q) => q.build_colors(target_colors),
            Quantizer::RgbQuant(q) => q.build_colors(target_colors),
        }
    }

    /// Produce a palette of at most `target_colors` entries.
    ///
    /// The result is deduplicated, sorted and padded to a power of two.
    pub fn build_palette(&mut self, target_colors: usize) -> Result<Palette, QuantizeError> {
        let colors = self.build_colors(target_colors)?;
        let palette = Palette::from_quantized(colors)?;
        tracing::debug!(
            quantizer = %self.kind(),
            target = target_colors,
            colors = palette.len(),
            "palette built"
        );
        Ok(palette)
    }
}

fn check_target(target_colors: usize) -> Result<(), QuantizeError> {
    if (2..=MAX_PALETTE_SIZE).contains(&target_colors) {
        Ok(())
    } else {
        Err(QuantizeError::InvalidColorCount(target_colors))
    }
}
