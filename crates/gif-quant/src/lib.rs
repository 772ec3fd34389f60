#![allow(
    clippy::excessive_precision,
    clippy::needless_range_loop,
    clippy::module_inception,
    clippy::manual_range_contains
)]

//! gif-quant: palette quantization, dithering and GIF encoding
//!
//! This library turns true-color RGBA frames into palette-indexed GIF89a
//! image blocks. It is the algorithm half of `gifloom`; scheduling, the
//! public encoder API and configuration live in the application crate.
//!
//! # Quick Start
//!
//! ```
//! use gif_quant::{
//!     dither, ColorDistance, DisposalMethod, DitherMode, DitherOptions, Frame, GifDocument,
//!     QuantizedFrame, Quantizer, QuantizerKind, Rgba,
//! };
//!
//! let frame = Frame::filled(4, 4, Rgba::opaque(200, 40, 40)).unwrap();
//! let distance = ColorDistance::default();
//!
//! let mut quantizer = Quantizer::new(QuantizerKind::Wu, distance);
//! quantizer.sample(&frame);
//! let palette = quantizer.build_palette(16).unwrap();
//!
//! let indices = dither::reduce(
//!     &frame,
//!     &palette,
//!     DitherMode::FloydSteinberg,
//!     &distance,
//!     &DitherOptions::default(),
//!     None,
//! );
//!
//! let mut doc = GifDocument::new(4, 4).with_repeat(Some(0));
//! doc.push(QuantizedFrame {
//!     width: 4,
//!     height: 4,
//!     indices,
//!     palette,
//!     transparent_index: None,
//!     disposal: DisposalMethod::Keep,
//!     delay: 10,
//! });
//! let bytes = doc.encode().unwrap();
//! assert_eq!(gif_quant::decode(&bytes).unwrap().frames.len(), 1);
//! ```
//!
//! # Pipeline
//!
//! ```text
//! Frame (RGBA8)
//!     |
//!     +---> transparency::substitute   (alpha below cut-off -> sentinel RGB)
//!     |
//!     v
//! Quantizer::sample / build_colors      (NeuQuant, Wu or RgbQuant)
//!     |
//!     +---> transparency::reserve_sentinel (own slot = transparency index)
//!     |
//!     v
//! dither::reduce                        (opaque pixels never take that slot)
//!     |
//!     v
//! QuantizedFrame -> GifDocument::encode (LZW, sub-blocks, GIF89a container)
//! ```
//!
//! # Color Distance
//!
//! Every color comparison goes through [`ColorDistance`]. The channel-wise
//! metrics (Euclidean and Manhattan, optionally BT.709 weighted) are fast
//! and good enough for most animations. The CIE metrics work in L*a*b* and
//! cost considerably more per comparison; they pay off mostly with the
//! histogram quantizer, which compares colors far more often than it
//! matches pixels.
//!
//! Alpha always takes part through a separately weighted term, so a
//! half-transparent color never silently matches an opaque one.
//!
//! # Determinism
//!
//! Quantizers, ditherers and the encoder hold no global state and use no
//! randomness. The same frames, options and metric produce byte-identical
//! output on every run.

pub mod color;
pub mod distance;
pub mod dither;
pub mod error;
pub mod frame;
pub mod gif;
pub mod palette;
pub mod quantize;
pub mod transparency;


pub use color::{hue_group, srgb8_to_linear, Hsl, Lab, Rgba};
pub use distance::{ColorDistance, DistanceMetric};
pub use dither::{DitherMode, DitherOptions, TransparentPixels};
pub use error::Error;
pub use frame::{Frame, FrameError};
pub use gif::{
    decode, DecodeError, DecodedFrame, DecodedGif, DisposalMethod, GifDocument, GifError,
    GifWriter, LzwError, QuantizedFrame,
};
pub use palette::{validate_user_palette, Palette, PaletteError, PaletteMatcher, ParseColorError};
pub use quantize::{HistogramMethod, QuantizeError, Quantizer, QuantizerKind};
