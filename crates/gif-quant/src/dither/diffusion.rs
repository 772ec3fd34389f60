//! Array-kernel error diffusion.

use super::{Dither, DitherOptions, Kernel, TransparentPixels};
use crate::color::Rgba;
use crate::distance::ColorDistance;
use crate::frame::Frame;
use crate::palette::{Palette, PaletteMatcher};

/// Sliding window of pending RGBA error rows.
///
/// Only the rows a kernel can reach are kept: `rows[0]` is the current row,
/// `rows[1]` the next one, and so on.
#[derive(Debug)]
pub struct ErrorBuffer {
    rows: Vec<Vec<[f64; 4]>>,
    width: usize,
}

impl ErrorBuffer {
    /// Create a buffer of `row_depth` rows (a kernel's `max_dy + 1`).
    pub fn new(width: usize, row_depth: usize) -> Self {
        Self {
            rows: (0..row_depth.max(1)).map(|_| vec![[0.0; 4]; width]).collect(),
            width,
        }
    }

    /// Error accumulated so far for `x` in the current row.
    #[inline]
    pub fn get_accumulated(&self, x: usize) -> [f64; 4] {
        self.rows[0][x]
    }

    /// Add error to a pixel `row_offset` rows ahead. Out-of-range targets
    /// are ignored.
    #[inline]
    pub fn add_error(&mut self, x: usize, row_offset: usize, error: [f64; 4]) {
        if x < self.width && row_offset < self.rows.len() {
            let cell = &mut self.rows[row_offset][x];
            for c in 0..4 {
                cell[c] += error[c];
            }
        }
    }

    /// Drop the current row and open a zeroed one at the far end.
    pub fn advance_row(&mut self) {
        self.rows.rotate_left(1);
        if let Some(last) = self.rows.last_mut() {
            last.fill([0.0; 4]);
        }
    }
}

/// Error diffusion driven by a [`Kernel`].
#[derive(Debug, Clone, Copy)]
pub struct ErrorDiffusion {
    kernel: &'static Kernel,
}

impl ErrorDiffusion {
    pub fn new(kernel: &'static Kernel) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &'static Kernel {
        self.kernel
    }
}

impl Dither for ErrorDiffusion {
    fn dither(
        &self,
        frame: &Frame,
        palette: &Palette,
        distance: &ColorDistance,
        options: &DitherOptions,
        transparent: Option<TransparentPixels<'_>>,
    ) -> Vec<u8> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;
        let kernel = self.kernel;
        let divisor = kernel.divisor as f64;

        let mut output = vec![0u8; width * height];
        let mut errors = ErrorBuffer::new(width, kernel.max_dy + 1);
        let mut matcher =
            PaletteMatcher::new(palette, *distance).excluding(transparent.map(|t| t.index));

        for y in 0..height {
            let reverse = options.serpentine && y % 2 == 1;
            let xs: Box<dyn Iterator<Item = usize>> = if reverse {
                Box::new((0..width).rev())
            } else {
                Box::new(0..width)
            };

            for x in xs {
                let idx = y * width + x;
                if let Some(index) = transparent.and_then(|t| t.index_at(idx)) {
                    output[idx] = index;
                    continue;
                }

                let original = frame.pixel(idx);
                let accumulated = errors.get_accumulated(x);
                let mut corrected = original.channels();
                for c in 0..4 {
                    corrected[c] += accumulated[c];
                }
                let corrected = Rgba::from_channels_rounded(corrected);

                let chosen = matcher.nearest(corrected);
                output[idx] = chosen;
                // Index always comes from this palette
                let Some(chosen_color) = palette.get(chosen as usize) else {
                    continue;
                };

                if options.minimum_color_distance > 0.0
                    && distance.normalized(original, chosen_color) < options.minimum_color_distance
                {
                    continue;
                }

                let source = if options.gimp_error {
                    corrected.channels()
                } else {
                    original.channels()
                };
                let target = chosen_color.channels();
                let residual = [
                    source[0] - target[0],
                    source[1] - target[1],
                    source[2] - target[2],
                    source[3] - target[3],
                ];

                for &(dx, dy, weight) in kernel.entries {
                    let dx = if reverse { -dx } else { dx };
                    let nx = x as i64 + dx as i64;
                    let ny = y + dy as usize;
                    if nx < 0 || nx as usize >= width || ny >= height {
                        continue;
                    }
                    let share = weight as f64 / divisor;
                    errors.add_error(nx as usize, dy as usize, residual.map(|e| e * share));
                }
            }
            errors.advance_row();
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dither::{ATKINSON, FLOYD_STEINBERG};
    use crate::distance::DistanceMetric;

    fn bw() -> Palette {
        Palette::new(&[Rgba::opaque(0, 0, 0), Rgba::opaque(255, 255, 255)]).unwrap()
    }

    fn bw_with_sentinel() -> Palette {
        Palette::new(&[
            Rgba::opaque(0, 0, 0),
            Rgba::opaque(0, 0, 1),
            Rgba::opaque(128, 128, 128),
            Rgba::opaque(255, 255, 255),
        ])
        .unwrap()
    }

    fn euclid() -> ColorDistance {
        ColorDistance::new(DistanceMetric::Euclidean)
    }

    #[test]
    fn test_error_buffer_rotates() {
        let mut buf = ErrorBuffer::new(3, 2);
        buf.add_error(1, 1, [1.0, 2.0, 3.0, 4.0]);
        buf.add_error(5, 0, [9.0; 4]);
        assert_eq!(buf.get_accumulated(1), [0.0; 4]);
        buf.advance_row();
        assert_eq!(buf.get_accumulated(1), [1.0, 2.0, 3.0, 4.0]);
        buf.advance_row();
        assert_eq!(buf.get_accumulated(1), [0.0; 4]);
    }

    #[test]
    fn test_mid_grey_alternates() {
        let frame = Frame::filled(4, 1, Rgba::opaque(128, 128, 128)).unwrap();
        let indices = ErrorDiffusion::new(&FLOYD_STEINBERG).dither(
            &frame,
            &bw(),
            &euclid(),
            &DitherOptions::default(),
            None,
        );
        // 128 -> white (err -127), then 128 - 55.6 -> black (err +128), ...
        assert_eq!(indices, vec![1, 0, 1, 0]);
    }

    #[test]
    fn test_grey_ratio_is_preserved() {
        let frame = Frame::filled(32, 32, Rgba::opaque(64, 64, 64)).unwrap();
        let indices = ErrorDiffusion::new(&FLOYD_STEINBERG).dither(
            &frame,
            &bw(),
            &euclid(),
            &DitherOptions::default(),
            None,
        );
        let white = indices.iter().filter(|&&i| i == 1).count() as f64;
        let ratio = white / indices.len() as f64;
        assert!((ratio - 64.0 / 255.0).abs() < 0.05, "white ratio {ratio}");
    }

    #[test]
    fn test_minimum_distance_suppresses_diffusion() {
        let frame = Frame::filled(4, 1, Rgba::opaque(128, 128, 128)).unwrap();
        let options = DitherOptions::default().minimum_color_distance(1.0);
        let indices =
            ErrorDiffusion::new(&FLOYD_STEINBERG).dither(&frame, &bw(), &euclid(), &options, None);
        assert_eq!(indices, vec![1; 4]);
    }

    #[test]
    fn test_masked_pixels_neither_receive_nor_emit() {
        // Without the mask the black pixel would push error into its neighbour
        let pixels = [
            Rgba::opaque(0, 0, 0),
            Rgba::opaque(128, 128, 128),
            Rgba::opaque(128, 128, 128),
        ];
        let frame = Frame::from_pixels(3, 1, &pixels).unwrap();
        let palette = Palette::new(&[
            Rgba::opaque(0, 0, 1),
            Rgba::opaque(0, 0, 0),
            Rgba::opaque(255, 255, 255),
            Rgba::opaque(40, 40, 40),
        ])
        .unwrap();
        let mask = [true, false, false];
        let masked = ErrorDiffusion::new(&ATKINSON).dither(
            &frame,
            &palette,
            &euclid(),
            &DitherOptions::default(),
            Some(TransparentPixels {
                mask: &mask,
                index: 0,
            }),
        );
        let grey_only = Frame::from_pixels(2, 1, &pixels[1..]).unwrap();
        let unmasked = [false; 2];
        let plain = ErrorDiffusion::new(&ATKINSON).dither(
            &grey_only,
            &palette,
            &euclid(),
            &DitherOptions::default(),
            Some(TransparentPixels {
                mask: &unmasked,
                index: 0,
            }),
        );
        assert_eq!(masked[0], 0);
        assert_eq!(&masked[1..], plain.as_slice());
    }

    #[test]
    fn test_opaque_pixels_never_take_transparent_slot() {
        // Black matches slot 0 exactly, but slot 0 is the transparency index
        let pixels = [
            Rgba::opaque(0, 0, 0),
            Rgba::opaque(0, 0, 1),
            Rgba::opaque(0, 0, 0),
            Rgba::opaque(10, 10, 10),
        ];
        let frame = Frame::from_pixels(2, 2, &pixels).unwrap();
        let mask = [false; 4];
        let indices = ErrorDiffusion::new(&FLOYD_STEINBERG).dither(
            &frame,
            &bw_with_sentinel(),
            &euclid(),
            &DitherOptions::default(),
            Some(TransparentPixels {
                mask: &mask,
                index: 0,
            }),
        );
        assert!(indices.iter().all(|&i| i != 0), "{indices:?}");
    }

    #[test]
    fn test_serpentine_is_deterministic() {
        let pixels: Vec<Rgba> = (0..64u32)
            .map(|i| Rgba::opaque((i * 4) as u8, (255 - i * 4) as u8, 100))
            .collect();
        let frame = Frame::from_pixels(8, 8, &pixels).unwrap();
        let palette = Palette::new(&[
            Rgba::opaque(0, 0, 0),
            Rgba::opaque(255, 0, 0),
            Rgba::opaque(0, 255, 0),
            Rgba::opaque(255, 255, 255),
        ])
        .unwrap();
        let run = || {
            ErrorDiffusion::new(&FLOYD_STEINBERG).dither(
                &frame,
                &palette,
                &ColorDistance::default(),
                &DitherOptions::default(),
                None,
            )
        };
        let first = run();
        assert_eq!(first, run());
        assert!(first.iter().all(|&i| (i as usize) < palette.len()));
    }
}
