//! Error types for GIF encoding and decoding.

use thiserror::Error;

/// Writer stage, for [`GifError::InvalidState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterStage {
    /// Nothing written yet
    Start,
    /// Header written, accepting frames
    Frames,
    /// Trailer written
    Finished,
}

/// A GIF format invariant was violated. Raised before any byte of the
/// offending block is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GifError {
    /// Writer method called out of order
    #[error("invalid writer state: cannot {operation} in stage {stage:?}")]
    InvalidState {
        operation: &'static str,
        stage: WriterStage,
    },
    /// Width or height outside `1..=65535`
    #[error("{field} {value} is outside 1..=65535")]
    InvalidDimension { field: &'static str, value: u32 },
    /// Color table size not a power of two in `2..=256`
    #[error("color table size {0} is not a power of two in 2..=256")]
    InvalidPaletteSize(usize),
    /// Frame dimensions differ from the logical screen
    #[error("frame {frame} is {width}x{height}, canvas is {canvas_width}x{canvas_height}")]
    FrameSizeMismatch {
        frame: usize,
        width: u32,
        height: u32,
        canvas_width: u32,
        canvas_height: u32,
    },
    /// Index buffer length differs from `width * height`
    #[error("frame {frame} has {actual} indices, expected {expected}")]
    IndexCountMismatch {
        frame: usize,
        expected: usize,
        actual: usize,
    },
    /// A pixel index points past the end of the frame's palette
    #[error("frame {frame}: index {index} at pixel {position} exceeds palette of {palette_len}")]
    IndexOutOfRange {
        frame: usize,
        position: usize,
        index: u8,
        palette_len: usize,
    },
    /// Transparency index points past the end of the frame's palette
    #[error("frame {frame}: transparency index {index} exceeds palette of {palette_len}")]
    TransparencyIndexOutOfRange {
        frame: usize,
        index: u8,
        palette_len: usize,
    },
}

/// Malformed LZW code stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LzwError {
    /// Minimum code size outside `2..=8`
    #[error("invalid LZW minimum code size {0}")]
    InvalidMinCodeSize(u8),
    /// A code that is neither in the table nor the next code to be added
    #[error("invalid LZW code {code} (next free code {next})")]
    InvalidCode { code: u16, next: u16 },
    /// The stream must start with a literal or clear code
    #[error("LZW stream starts with code {0}")]
    InvalidFirstCode(u16),
}

/// Malformed GIF file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Missing `GIF87a`/`GIF89a` signature
    #[error("not a GIF file")]
    InvalidSignature,
    /// Input ended inside a block
    #[error("unexpected end of data while reading {0}")]
    UnexpectedEof(&'static str),
    /// Unknown block introducer
    #[error("unknown block 0x{byte:02x} at offset {offset}")]
    UnknownBlock { byte: u8, offset: usize },
    /// Image block without any color table in scope
    #[error("frame {0} has no color table")]
    MissingColorTable(usize),
    /// Image descriptor with a zero width or height
    #[error("frame {frame} is {width}x{height}, images need at least one pixel")]
    EmptyImage { frame: usize, width: u16, height: u16 },
    /// Decompressed image has fewer pixels than its descriptor states
    #[error("frame {frame} decoded to {actual} pixels, expected {expected}")]
    ShortImage {
        frame: usize,
        expected: usize,
        actual: usize,
    },
    /// LZW stream error
    #[error("LZW: {0}")]
    Lzw(#[from] LzwError),
}
