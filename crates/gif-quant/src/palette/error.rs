//! Error types for color parsing and palette construction.

use std::num::ParseIntError;

use thiserror::Error;

/// Error returned when parsing a hex color string fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseColorError {
    /// Hex string has an invalid length (3, 6 or 8 digits after stripping '#')
    #[error("invalid hex color length {0} (expected 3, 6 or 8 digits)")]
    InvalidLength(usize),
    /// Invalid hexadecimal character encountered
    #[error("invalid hex character: {0}")]
    InvalidHex(#[from] ParseIntError),
    /// Input contains non-ASCII characters
    #[error("hex color contains non-ASCII characters")]
    NonAscii,
}

/// Error returned when a palette cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    /// No colors provided
    #[error("palette cannot be empty")]
    EmptyPalette,
    /// Palette size outside `2..=256` or not a power of two
    #[error("palette size {0} is not a power of two in 2..=256")]
    InvalidSize(usize),
    /// Duplicate color found at the specified index
    #[error("duplicate color found at index {index}")]
    DuplicateColor {
        /// Index where the duplicate was found
        index: usize,
    },
    /// Invalid hex color string
    #[error("invalid color: {0}")]
    ParseColor(#[from] ParseColorError),
}
