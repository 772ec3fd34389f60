//! Crate-level error type.

use thiserror::Error;

use crate::frame::FrameError;
use crate::gif::{DecodeError, GifError};
use crate::palette::PaletteError;
use crate::quantize::QuantizeError;

/// Any error this crate can return.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Palette(#[from] PaletteError),
    #[error(transparent)]
    Quantize(#[from] QuantizeError),
    #[error(transparent)]
    Gif(#[from] GifError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
