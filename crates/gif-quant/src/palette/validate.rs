//! Correction of caller-supplied palettes.

use tracing::warn;

use super::palette::{dedup, Palette, MAX_PALETTE_SIZE};
use crate::color::Rgba;

/// Coerce an arbitrary color list into a legal GIF palette.
///
/// Never fails; every correction is logged at `warn` level:
/// - repeated colors are dropped
/// - fewer than two colors are padded with black (or the lowest unused
///   opaque color when black is already present)
/// - more than 256 colors are truncated
/// - a count that is not a power of two is trimmed from the end
///
/// Surviving colors keep the caller's order.
pub fn validate_user_palette(colors: &[Rgba]) -> Palette {
    let original_len = colors.len();
    let mut colors = dedup(colors.to_vec());
    if colors.len() != original_len {
        warn!(
            removed = original_len - colors.len(),
            "palette contains duplicate colors, keeping first occurrences"
        );
    }

    if colors.len() < 2 {
        warn!(len = colors.len(), "palette has fewer than 2 colors, padding with black");
        let mut candidate = 0u32;
        while colors.len() < 2 {
            let filler = Rgba::from_rgb_hex(candidate);
            if !colors.contains(&filler) {
                colors.push(filler);
            }
            candidate += 1;
        }
    }

    if colors.len() > MAX_PALETTE_SIZE {
        warn!(len = colors.len(), "palette has more than 256 colors, truncating");
        colors.truncate(MAX_PALETTE_SIZE);
    }

    if !colors.len().is_power_of_two() {
        // Largest power of two not above the current length
        let target = 1usize << (usize::BITS - 1 - colors.len().leading_zeros());
        warn!(
            len = colors.len(),
            target, "palette size is not a power of two, trimming from the end"
        );
        colors.truncate(target);
    }

    Palette::from_unchecked(colors)
}
