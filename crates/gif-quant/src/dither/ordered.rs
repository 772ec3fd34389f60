//! Ordered dithering with an 8×8 Bayer threshold matrix.

use super::{Dither, DitherOptions, TransparentPixels};
use crate::color::Rgba;
use crate::distance::ColorDistance;
use crate::frame::Frame;
use crate::palette::{Palette, PaletteMatcher};

/// Recursive Bayer index matrix, values `0..64`.
const BAYER_8X8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Threshold offset for `(x, y)` in `-0.5..0.5`.
#[inline]
fn threshold(x: usize, y: usize) -> f64 {
    BAYER_8X8[y % 8][x % 8] as f64 / 64.0 - 0.5
}

/// Bayer ordered dithering.
///
/// Each pixel's R, G and B are offset by the matrix threshold times
/// `255 / cbrt(palette_len)`, roughly the spacing of a uniform palette of
/// that size, before the nearest-color lookup. Stateless per pixel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bayer;

impl Dither for Bayer {
    fn dither(
        &self,
        frame: &Frame,
        palette: &Palette,
        distance: &ColorDistance,
        _options: &DitherOptions,
        transparent: Option<TransparentPixels<'_>>,
    ) -> Vec<u8> {
        let width = frame.width() as usize;
        let spread = 255.0 / (palette.len() as f64).cbrt();
        let mut matcher =
            PaletteMatcher::new(palette, *distance).excluding(transparent.map(|t| t.index));

        frame
            .pixels()
            .enumerate()
            .map(|(i, px)| {
                if let Some(index) = transparent.and_then(|t| t.index_at(i)) {
                    return index;
                }
                let offset = threshold(i % width, i / width) * spread;
                let [r, g, b, a] = px.channels();
                let shifted = Rgba::from_channels_rounded([r + offset, g + offset, b + offset, a]);
                matcher.nearest(shifted)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_matrix_is_a_permutation() {
        let values: HashSet<u8> = BAYER_8X8.iter().flatten().copied().collect();
        assert_eq!(values.len(), 64);
        assert_eq!(values.iter().max(), Some(&63));
    }

    #[test]
    fn test_mid_grey_half_covered() {
        let palette =
            Palette::new(&[Rgba::opaque(0, 0, 0), Rgba::opaque(255, 255, 255)]).unwrap();
        let frame = Frame::filled(8, 8, Rgba::opaque(128, 128, 128)).unwrap();
        let indices = Bayer.dither(
            &frame,
            &palette,
            &ColorDistance::default(),
            &DitherOptions::default(),
            None,
        );
        let white = indices.iter().filter(|&&i| i == 1).count();
        assert!((28..=36).contains(&white), "{white} white pixels");
    }

    #[test]
    fn test_threshold_range() {
        for y in 0..8 {
            for x in 0..8 {
                let t = threshold(x, y);
                assert!((-0.5..0.5).contains(&t));
            }
        }
    }
}
