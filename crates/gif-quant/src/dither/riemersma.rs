//! Riemersma dithering: error history carried along a Hilbert curve.

use super::{Dither, DitherOptions, TransparentPixels};
use crate::color::Rgba;
use crate::distance::ColorDistance;
use crate::frame::Frame;
use crate::palette::{Palette, PaletteMatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Stay,
    Up,
    Left,
    Right,
    Down,
}

struct HilbertWalk<'f, F: FnMut(usize, usize)> {
    width: i64,
    height: i64,
    level: u32,
    x: i64,
    y: i64,
    visit_fn: &'f mut F,
}

impl<F: FnMut(usize, usize)> HilbertWalk<'_, F> {
    fn walk(&mut self, direction: Direction) {
        use Direction::*;
        if self.level < 1 {
            return;
        }
        self.level -= 1;
        match direction {
            Left => {
                self.walk(Up);
                self.visit(Right);
                self.walk(Left);
                self.visit(Down);
                self.walk(Left);
                self.visit(Left);
                self.walk(Down);
            }
            Right => {
                self.walk(Down);
                self.visit(Left);
                self.walk(Right);
                self.visit(Up);
                self.walk(Right);
                self.visit(Right);
                self.walk(Up);
            }
            Up => {
                self.walk(Left);
                self.visit(Down);
                self.walk(Up);
                self.visit(Right);
                self.walk(Up);
                self.visit(Up);
                self.walk(Right);
            }
            Down => {
                self.walk(Right);
                self.visit(Up);
                self.walk(Down);
                self.visit(Left);
                self.walk(Down);
                self.visit(Down);
                self.walk(Left);
            }
            Stay => {}
        }
        self.level += 1;
    }

    /// Report the current cell if it is inside the image, then step.
    fn visit(&mut self, direction: Direction) {
        if self.x >= 0 && self.x < self.width && self.y >= 0 && self.y < self.height {
            (self.visit_fn)(self.x as usize, self.y as usize);
        }
        match direction {
            Direction::Left => self.x -= 1,
            Direction::Right => self.x += 1,
            Direction::Up => self.y -= 1,
            Direction::Down => self.y += 1,
            Direction::Stay => {}
        }
    }
}

/// Visit every pixel of a `width × height` image exactly once in Hilbert
/// order, walking the enclosing power-of-two square and skipping cells
/// outside the image.
pub fn hilbert_curve(width: usize, height: usize, mut visit: impl FnMut(usize, usize)) {
    let max_bound = width.max(height);
    if max_bound == 0 {
        return;
    }
    let level = usize::BITS - max_bound.leading_zeros();
    let mut walk = HilbertWalk {
        width: width as i64,
        height: height as i64,
        level,
        x: 0,
        y: 0,
        visit_fn: &mut visit,
    };
    walk.walk(Direction::Up);
    walk.visit(Direction::Stay);
}

/// History weights, oldest first: `round_down(next + 0.5) / size`, with
/// `next` growing geometrically from 1 to `size`.
fn weights(size: usize, propagation: f64) -> Vec<f64> {
    let max = size as f64;
    let multiplier = if size > 1 {
        (max.ln() / (size - 1) as f64).exp()
    } else {
        1.0
    };
    let mut next = 1.0f64;
    (0..size)
        .map(|_| {
            let w = (next + 0.5).floor() / max * propagation;
            next *= multiplier;
            w
        })
        .collect()
}

/// Riemersma dithering.
#[derive(Debug, Clone, Copy, Default)]
pub struct Riemersma;

impl Dither for Riemersma {
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
        let size = options.error_queue_size.max(1);
        let weights = weights(size, options.error_propagation);

        let mut output = vec![0u8; width * height];
        let mut queue = vec![[0.0f64; 4]; size];
        let mut head = 0usize;
        let mut matcher =
            PaletteMatcher::new(palette, *distance).excluding(transparent.map(|t| t.index));

        hilbert_curve(width, height, |x, y| {
            let idx = y * width + x;
            if let Some(index) = transparent.and_then(|t| t.index_at(idx)) {
                output[idx] = index;
                return;
            }

            let px = frame.pixel(idx);
            let mut corrected = px.channels();
            for (i, w) in weights.iter().enumerate() {
                let e = &queue[(i + head) % size];
                for c in 0..4 {
                    corrected[c] += e[c] * w;
                }
            }
            let chosen = matcher.nearest(Rgba::from_channels_rounded(corrected));
            output[idx] = chosen;

            let target = palette.get(chosen as usize).unwrap_or(px).channels();
            let original = px.channels();
            head = (head + 1) % size;
            let tail = (head + size - 1) % size;
            for c in 0..4 {
                queue[tail][c] = original[c] - target[c];
            }
        });
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMetric;

    #[test]
    fn test_hilbert_visits_every_pixel_once() {
        for (w, h) in [(1, 1), (2, 2), (3, 5), (4, 4), (7, 3), (16, 16), (10, 1), (33, 17)] {
            let mut seen = vec![0u32; w * h];
            hilbert_curve(w, h, |x, y| seen[y * w + x] += 1);
            assert!(seen.iter().all(|&n| n == 1), "{w}x{h}: {seen:?}");
        }
    }

    #[test]
    fn test_hilbert_order_on_small_square() {
        let mut order = Vec::new();
        hilbert_curve(2, 2, |x, y| order.push((x, y)));
        assert_eq!(order, vec![(0, 0), (1, 0), (1, 1), (0, 1)]);
    }

    #[test]
    fn test_weights_grow_to_propagation() {
        let w = weights(16, 1.0);
        assert_eq!(w.len(), 16);
        assert_eq!(w[0], 1.0 / 16.0);
        assert!((w[15] - 1.0).abs() < 1e-12);
        assert!(w.windows(2).all(|p| p[0] <= p[1]));
        assert_eq!(weights(1, 0.5), vec![0.5]);
    }

    #[test]
    fn test_grey_gets_mixed() {
        let palette =
            Palette::new(&[Rgba::opaque(0, 0, 0), Rgba::opaque(255, 255, 255)]).unwrap();
        let frame = Frame::filled(16, 16, Rgba::opaque(128, 128, 128)).unwrap();
        let indices = Riemersma.dither(
            &frame,
            &palette,
            &ColorDistance::new(DistanceMetric::Euclidean),
            &DitherOptions::default(),
            None,
        );
        let white = indices.iter().filter(|&&i| i == 1).count();
        assert!(white > 64 && white < 192, "{white} white pixels");
    }
}
