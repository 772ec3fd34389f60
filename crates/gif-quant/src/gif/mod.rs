//! GIF89a container encoding and decoding.
//!
//! [`GifDocument`] collects [`QuantizedFrame`]s and serializes them through
//! the sequential [`GifWriter`]. [`decode`] parses a byte stream back into
//! indices and color tables, which is what the round-trip tests and the
//! `inspect` command rely on.

mod decoder;
mod document;
mod error;
pub mod lzw;
mod writer;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use decoder::{decode, DecodedFrame, DecodedGif};
pub use document::{GifDocument, QuantizedFrame};
pub use error::{DecodeError, GifError, LzwError, WriterStage};
pub use writer::GifWriter;

pub(crate) const SIGNATURE: &[u8; 6] = b"GIF89a";
pub(crate) const SIGNATURE_87A: &[u8; 6] = b"GIF87a";
pub(crate) const EXTENSION_INTRODUCER: u8 = 0x21;
pub(crate) const IMAGE_SEPARATOR: u8 = 0x2C;
pub(crate) const TRAILER: u8 = 0x3B;
pub(crate) const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
pub(crate) const APPLICATION_LABEL: u8 = 0xFF;
pub(crate) const NETSCAPE_ID: &[u8; 11] = b"NETSCAPE2.0";

/// Largest data sub-block payload.
pub(crate) const MAX_SUB_BLOCK: usize = 255;

/// What a viewer does with a frame before drawing the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisposalMethod {
    /// No disposal specified (code 0)
    #[default]
    Unspecified,
    /// Leave the frame in place (code 1)
    Keep,
    /// Restore the area to the background (code 2)
    Background,
    /// Restore the area to the previous frame (code 3)
    Previous,
}

impl DisposalMethod {
    /// The 3-bit code stored in the Graphics Control Extension.
    pub fn code(self) -> u8 {
        match self {
            DisposalMethod::Unspecified => 0,
            DisposalMethod::Keep => 1,
            DisposalMethod::Background => 2,
            DisposalMethod::Previous => 3,
        }
    }

    /// Inverse of [`code`](Self::code); reserved codes 4–7 map to `Unspecified`.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => DisposalMethod::Keep,
            2 => DisposalMethod::Background,
            3 => DisposalMethod::Previous,
            _ => DisposalMethod::Unspecified,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DisposalMethod::Unspecified => "unspecified",
            DisposalMethod::Keep => "keep",
            DisposalMethod::Background => "background",
            DisposalMethod::Previous => "previous",
        }
    }
}

impl fmt::Display for DisposalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown disposal method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown disposal method '{0}' (expected 0-3 or unspecified, keep, background, previous)")]
pub struct UnknownDisposal(pub String);

impl FromStr for DisposalMethod {
    type Err = UnknownDisposal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "unspecified" | "none" => Ok(DisposalMethod::Unspecified),
            "1" | "keep" => Ok(DisposalMethod::Keep),
            "2" | "background" => Ok(DisposalMethod::Background),
            "3" | "previous" => Ok(DisposalMethod::Previous),
            _ => Err(UnknownDisposal(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposal_codes() {
        for code in 0..4 {
            assert_eq!(DisposalMethod::from_code(code).code(), code);
        }
        assert_eq!(DisposalMethod::from_code(7), DisposalMethod::Unspecified);
        assert_eq!("2".parse::<DisposalMethod>().unwrap(), DisposalMethod::Background);
        assert_eq!("Keep".parse::<DisposalMethod>().unwrap(), DisposalMethod::Keep);
        assert!("restore".parse::<DisposalMethod>().is_err());
    }
}
