//! Assertion helpers for tests.

use gif_quant::{decode, DecodedGif};
use pretty_assertions::assert_eq;

/// Assert `bytes` is a well-formed GIF89a and return its decoded form.
pub fn assert_gif(bytes: &[u8]) -> DecodedGif {
    assert!(
        bytes.starts_with(b"GIF89a"),
        "Expected GIF89a signature, got {:?}",
        &bytes[..6.min(bytes.len())]
    );
    assert_eq!(bytes.last(), Some(&0x3B), "Missing GIF trailer");
    decode(bytes).unwrap_or_else(|e| panic!("GIF failed to decode: {e}"))
}

/// Assert every frame's indices fit its palette.
pub fn assert_indices_in_range(gif: &DecodedGif) {
    for (i, frame) in gif.frames.iter().enumerate() {
        assert_eq!(
            frame.indices.len(),
            frame.width as usize * frame.height as usize,
            "frame {i} index count"
        );
        if let Some(bad) = frame.indices.iter().find(|&&ix| ix as usize >= frame.palette.len()) {
            panic!("frame {i}: index {bad} outside palette of {}", frame.palette.len());
        }
    }
}
