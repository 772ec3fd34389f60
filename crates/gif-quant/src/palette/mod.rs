//! Palette types and utilities
//!
//! [`Palette`] is the color table shared by quantizers, ditherers and the
//! GIF writer. [`validate_user_palette`] coerces caller input into one.

mod error;
mod palette;
mod validate;

pub use error::{PaletteError, ParseColorError};
pub use palette::{is_valid_size, sort_colors, Palette, PaletteMatcher, MAX_PALETTE_SIZE};
pub use validate::validate_user_palette;
