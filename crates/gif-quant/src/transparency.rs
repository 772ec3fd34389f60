//! Carrying fully transparent pixels through quantization.
//!
//! GIF has a single transparency index per frame and no partial alpha. A
//! frame's transparent pixels are repainted with a sentinel RGB value that
//! occurs nowhere else in the frame; after quantization the sentinel is
//! pinned into the palette and its slot becomes the transparency index.

use tracing::debug;

use crate::color::Rgba;
use crate::distance::ColorDistance;
use crate::frame::Frame;
use crate::palette::{Palette, PaletteError, MAX_PALETTE_SIZE};

const RGB_SPACE: usize = 1 << 24;

/// Set of 24-bit RGB values.
struct RgbSet {
    words: Vec<u64>,
}

impl RgbSet {
    fn new() -> Self {
        Self {
            words: vec![0; RGB_SPACE / 64],
        }
    }

    #[inline]
    fn insert(&mut self, rgb: u32) {
        self.words[(rgb >> 6) as usize] |= 1 << (rgb & 63);
    }

    /// Smallest value not in the set.
    fn first_absent(&self) -> Option<u32> {
        self.words
            .iter()
            .position(|&w| w != u64::MAX)
            .map(|i| (i as u32) << 6 | self.words[i].trailing_ones())
    }
}

/// The first RGB value, scanning up from `0x000000`, that no pixel of
/// `frame` uses (alpha ignored). Returned opaque. `None` only if every one
/// of the 2^24 values occurs.
pub fn find_unused_color(frame: &Frame) -> Option<Rgba> {
    let mut used = RgbSet::new();
    for px in frame.pixels() {
        used.insert(px.to_rgb_hex());
    }
    used.first_absent().map(Rgba::from_rgb_hex)
}

/// Whether any pixel's alpha falls below `cut_off * 255`.
pub fn has_transparency(frame: &Frame, cut_off: f64) -> bool {
    let limit = cut_off * 255.0;
    frame.pixels().any(|px| (px.a as f64) < limit)
}

/// Repaint pixels with alpha below `cut_off * 255` as the opaque `sentinel`
/// and make every other pixel opaque.
///
/// Returns the rewritten frame and one flag per pixel, set where the pixel
/// was transparent.
pub fn substitute(frame: Frame, sentinel: Rgba, cut_off: f64) -> (Frame, Vec<bool>) {
    let limit = cut_off * 255.0;
    let sentinel = sentinel.to_opaque();
    let (width, height) = (frame.width(), frame.height());
    let mut data = frame.into_data();
    let mut mask = Vec::with_capacity(data.len() / 4);

    for px in data.chunks_exact_mut(4) {
        let transparent = (px[3] as f64) < limit;
        if transparent {
            px.copy_from_slice(&[sentinel.r, sentinel.g, sentinel.b, 255]);
        } else {
            px[3] = 255;
        }
        mask.push(transparent);
    }

    (Frame::from_raw_parts(width, height, data), mask)
}

/// Force every pixel opaque, for frames encoded without transparency.
pub fn make_opaque(frame: Frame) -> Frame {
    let (width, height) = (frame.width(), frame.height());
    let mut data = frame.into_data();
    for px in data.chunks_exact_mut(4) {
        px[3] = 255;
    }
    Frame::from_raw_parts(width, height, data)
}

/// Make `sentinel` an exact palette entry and return its index.
///
/// If it is absent, the entry nearest to it is overwritten.
pub fn ensure_sentinel(palette: &mut Palette, sentinel: Rgba, distance: &ColorDistance) -> usize {
    let sentinel = sentinel.to_opaque();
    if let Some(index) = palette.index_of(sentinel) {
        return index;
    }
    let index = palette.nearest(sentinel, distance);
    debug!(
        %sentinel,
        replaced = %palette.colors()[index],
        index,
        "pinning transparency sentinel into palette"
    );
    // The sentinel is absent, so no duplicate can arise
    let _ = palette.set(index, sentinel);
    index
}

/// Finish raw quantizer output into a palette where `sentinel` has a slot
/// of its own, and return that slot.
///
/// At most `target_colors` entries are kept, the sentinel included; when
/// the quantized colors would overflow that, the ones closest to the
/// sentinel are dropped. Quantized colors equal to the sentinel are
/// dropped as well.
pub fn reserve_sentinel(
    mut colors: Vec<Rgba>,
    sentinel: Rgba,
    target_colors: usize,
    distance: &ColorDistance,
) -> Result<(Palette, usize), PaletteError> {
    let sentinel = sentinel.to_opaque();
    colors.sort_unstable();
    colors.dedup();
    colors.retain(|&c| c != sentinel);

    let limit = target_colors.clamp(2, MAX_PALETTE_SIZE) - 1;
    while colors.len() > limit {
        let closest = colors
            .iter()
            .enumerate()
            .map(|(i, c)| (i, distance.raw(sentinel.channels(), c.channels())))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);
        match closest {
            Some(i) => {
                colors.remove(i);
            }
            None => break,
        }
    }

    colors.push(sentinel);
    let mut palette = Palette::from_quantized(colors)?;
    let index = ensure_sentinel(&mut palette, sentinel, distance);
    Ok((palette, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unused_color_skips_present_values() {
        let frame = Frame::from_pixels(
            3,
            1,
            &[
                Rgba::new(0, 0, 0, 0),
                Rgba::opaque(0, 0, 1),
                Rgba::opaque(0, 0, 3),
            ],
        )
        .unwrap();
        assert_eq!(find_unused_color(&frame), Some(Rgba::opaque(0, 0, 2)));
    }

    #[test]
    fn test_reserved_sentinel_keeps_black() {
        let black = Rgba::opaque(0, 0, 0);
        let red = Rgba::opaque(255, 0, 0);
        let sentinel = Rgba::opaque(0, 0, 1);
        let (palette, index) =
            reserve_sentinel(vec![black, red, black], sentinel, 256, &ColorDistance::default())
                .unwrap();

        assert_eq!(palette.len(), 4);
        assert_eq!(palette.get(index), Some(sentinel));
        assert!(palette.index_of(black).is_some());
        assert!(palette.index_of(red).is_some());
    }

    #[test]
    fn test_reserved_sentinel_respects_target() {
        let sentinel = Rgba::opaque(0, 0, 1);
        let colors = vec![
            Rgba::opaque(0, 0, 0),
            Rgba::opaque(255, 255, 255),
            sentinel,
        ];
        let (palette, index) =
            reserve_sentinel(colors, sentinel, 2, &ColorDistance::default()).unwrap();

        // Black is the color closest to the sentinel, so it gives way
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.get(index), Some(sentinel));
        assert!(palette.index_of(Rgba::opaque(255, 255, 255)).is_some());
    }

    #[test]
    fn test_reserved_sentinel_alone() {
        let sentinel = Rgba::opaque(0, 0, 1);
        let (palette, index) =
            reserve_sentinel(Vec::new(), sentinel, 16, &ColorDistance::default()).unwrap();
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.get(index), Some(sentinel));
    }

    #[test]
    fn test_unused_color_crosses_word_boundary() {
        let pixels: Vec<Rgba> = (0..70u32).map(Rgba::from_rgb_hex).collect();
        let frame = Frame::from_pixels(70, 1, &pixels).unwrap();
        assert_eq!(find_unused_color(&frame), Some(Rgba::from_rgb_hex(70)));
    }

    #[test]
    fn test_substitute_masks_by_cut_off() {
        let frame = Frame::from_pixels(
            3,
            1,
            &[
                Rgba::new(10, 20, 30, 0),
                Rgba::new(10, 20, 30, 178),
                Rgba::new(10, 20, 30, 179),
            ],
        )
        .unwrap();
        // 0.7 * 255 = 178.5
        let (frame, mask) = substitute(frame, Rgba::opaque(1, 2, 3), 0.7);
        assert_eq!(mask, vec![true, true, false]);
        assert_eq!(frame.pixel(0), Rgba::opaque(1, 2, 3));
        assert_eq!(frame.pixel(1), Rgba::opaque(1, 2, 3));
        assert_eq!(frame.pixel(2), Rgba::opaque(10, 20, 30));
    }

    #[test]
    fn test_zero_cut_off_keeps_everything() {
        let frame = Frame::filled(2, 2, Rgba::new(5, 5, 5, 0)).unwrap();
        assert!(!has_transparency(&frame, 0.0));
        let (frame, mask) = substitute(frame, Rgba::opaque(0, 0, 0), 0.0);
        assert!(mask.iter().all(|m| !m));
        assert!(frame.pixels().all(|p| p == Rgba::opaque(5, 5, 5)));
    }

    #[test]
    fn test_make_opaque() {
        let frame = Frame::filled(2, 1, Rgba::new(9, 8, 7, 3)).unwrap();
        let frame = make_opaque(frame);
        assert!(frame.pixels().all(|p| p == Rgba::opaque(9, 8, 7)));
    }

    #[test]
    fn test_ensure_sentinel_replaces_nearest() {
        let mut palette = Palette::new(&[
            Rgba::opaque(0, 0, 0),
            Rgba::opaque(255, 255, 255),
        ])
        .unwrap();
        let d = ColorDistance::default();
        let index = ensure_sentinel(&mut palette, Rgba::opaque(0, 0, 1), &d);
        assert_eq!(index, 0);
        assert_eq!(palette.colors(), &[Rgba::opaque(0, 0, 1), Rgba::opaque(255, 255, 255)]);

        // Already present: nothing changes
        let again = ensure_sentinel(&mut palette, Rgba::opaque(0, 0, 1), &d);
        assert_eq!(again, 0);
        assert_eq!(palette.len(), 2);
    }
}
