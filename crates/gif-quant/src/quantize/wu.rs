//! Wu's greedy orthogonal bipartition quantizer, extended to RGBA.
//!
//! Pixels are binned into a 4D histogram of `2^bits + 1` cells per axis
//! (cell 0 is an empty guard plane), turned into cumulative moments so any
//! box's statistics are a 16-term inclusion-exclusion, and boxes are split
//! where the between-halves variance is largest.

use super::QuantizeError;
use crate::color::Rgba;
use crate::distance::ColorDistance;
use crate::frame::Frame;

/// Default significant bits per channel.
pub const DEFAULT_SIGNIFICANT_BITS: u8 = 5;
const MAX_SIGNIFICANT_BITS: u8 = 5;

const ALPHA: usize = 0;
const RED: usize = 1;
const GREEN: usize = 2;
const BLUE: usize = 3;

/// Per-cell moments: pixel count, channel sums and the sum of squares.
#[derive(Debug, Clone, Copy, Default)]
struct Moment {
    weight: f64,
    r: f64,
    g: f64,
    b: f64,
    a: f64,
    sq: f64,
}

impl Moment {
    #[inline]
    fn add(&mut self, o: &Moment) {
        self.weight += o.weight;
        self.r += o.r;
        self.g += o.g;
        self.b += o.b;
        self.a += o.a;
        self.sq += o.sq;
    }

    #[inline]
    fn scaled_add(&mut self, o: &Moment, sign: f64) {
        self.weight += sign * o.weight;
        self.r += sign * o.r;
        self.g += sign * o.g;
        self.b += sign * o.b;
        self.a += sign * o.a;
        self.sq += sign * o.sq;
    }

    #[inline]
    fn sub(&self, o: &Moment) -> Moment {
        Moment {
            weight: self.weight - o.weight,
            r: self.r - o.r,
            g: self.g - o.g,
            b: self.b - o.b,
            a: self.a - o.a,
            sq: self.sq - o.sq,
        }
    }

    #[inline]
    fn channel_sq(&self) -> f64 {
        self.r * self.r + self.g * self.g + self.b * self.b + self.a * self.a
    }
}

/// Half-open box `(min, max]` on each axis, indexed ALPHA, RED, GREEN, BLUE.
#[derive(Debug, Clone, Copy, Default)]
struct Cube {
    min: [usize; 4],
    max: [usize; 4],
}

impl Cube {
    fn volume(&self) -> usize {
        (0..4).map(|d| self.max[d] - self.min[d]).product()
    }
}

/// Variance-minimizing box splitter.
#[derive(Debug, Clone)]
pub struct WuQuant {
    distance: ColorDistance,
    bits: u8,
    side: usize,
    moments: Vec<Moment>,
    pixels: Vec<Rgba>,
}

impl WuQuant {
    pub fn new(distance: ColorDistance) -> Self {
        Self::with_significant_bits(distance, DEFAULT_SIGNIFICANT_BITS)
    }

    /// Use `bits` histogram bits per channel, clamped to `1..=5`.
    ///
    /// The histogram holds `(2^bits + 1)^4` cells, so finer grids are not
    /// offered.
    pub fn with_significant_bits(distance: ColorDistance, bits: u8) -> Self {
        let bits = bits.clamp(1, MAX_SIGNIFICANT_BITS);
        let side = (1usize << bits) + 1;
        Self {
            distance,
            bits,
            side,
            moments: vec![Moment::default(); side * side * side * side],
            pixels: Vec::new(),
        }
    }

    #[inline]
    fn index(&self, a: usize, r: usize, g: usize, b: usize) -> usize {
        ((a * self.side + r) * self.side + g) * self.side + b
    }

    pub fn sample(&mut self, frame: &Frame) {
        let shift = 8 - self.bits;
        for px in frame.pixels() {
            let idx = self.index(
                (px.a >> shift) as usize + 1,
                (px.r >> shift) as usize + 1,
                (px.g >> shift) as usize + 1,
                (px.b >> shift) as usize + 1,
            );
            let [r, g, b, a] = px.channels();
            let m = &mut self.moments[idx];
            m.weight += 1.0;
            m.r += r;
            m.g += g;
            m.b += b;
            m.a += a;
            m.sq += r * r + g * g + b * b + a * a;
        }
        self.pixels.extend(frame.pixels());
    }

    pub(crate) fn build_colors(&mut self, target: usize) -> Result<Vec<Rgba>, QuantizeError> {
        if self.pixels.is_empty() {
            return Err(QuantizeError::EmptySample);
        }
        let cumulative = self.cumulative_moments();
        let cubes = self.split(&cumulative, target);

        let lookups: Vec<[f64; 4]> = cubes
            .iter()
            .map(|cube| {
                let m = volume(cube, &cumulative, self.side);
                if m.weight > 0.0 {
                    [
                        (m.r / m.weight).trunc(),
                        (m.g / m.weight).trunc(),
                        (m.b / m.weight).trunc(),
                        (m.a / m.weight).trunc(),
                    ]
                } else {
                    [0.0; 4]
                }
            })
            .collect();

        // Refine: average the pixels nearest to each box centroid
        let mut sums = vec![[0.0f64; 5]; lookups.len()];
        for px in &self.pixels {
            let c = px.channels();
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (i, l) in lookups.iter().enumerate() {
                let d = self.distance.raw(*l, c);
                if d < best_dist {
                    best_dist = d;
                    best = i;
                }
            }
            let s = &mut sums[best];
            for ch in 0..4 {
                s[ch] += c[ch];
            }
            s[4] += 1.0;
        }

        Ok(sums
            .iter()
            .filter(|s| s[4] > 0.0)
            .map(|s| {
                let avg = |ch: usize| (s[ch] / s[4]).trunc() as u8;
                Rgba::new(avg(0), avg(1), avg(2), avg(3))
            })
            .collect())
    }

    /// Prefix sums along each of the four axes in turn.
    fn cumulative_moments(&self) -> Vec<Moment> {
        let side = self.side;
        let mut m = self.moments.clone();
        let strides = [side * side * side, side * side, side, 1];
        for stride in strides {
            for idx in 0..m.len() {
                if (idx / stride) % side == 0 {
                    continue;
                }
                let prev = m[idx - stride];
                m[idx].add(&prev);
            }
        }
        m
    }

    fn split(&self, cumulative: &[Moment], target: usize) -> Vec<Cube> {
        let top = self.side - 1;
        let mut cubes = vec![Cube {
            min: [0; 4],
            max: [top; 4],
        }];
        let mut variances = vec![0.0f64];

        let mut next = 0;
        while cubes.len() < target {
            let mut second = Cube::default();
            if self.cut(cumulative, &mut cubes[next], &mut second) {
                variances[next] = if cubes[next].volume() > 1 {
                    variance(&cubes[next], cumulative, self.side)
                } else {
                    0.0
                };
                let v = if second.volume() > 1 {
                    variance(&second, cumulative, self.side)
                } else {
                    0.0
                };
                cubes.push(second);
                variances.push(v);
            } else {
                variances[next] = 0.0;
            }

            next = 0;
            let mut best = variances[0];
            for (i, &v) in variances.iter().enumerate().skip(1) {
                if v > best {
                    best = v;
                    next = i;
                }
            }
            if best <= 0.0 {
                break;
            }
        }
        cubes
    }

    /// Split `first` at its best plane; `second` receives the upper part.
    fn cut(&self, cumulative: &[Moment], first: &mut Cube, second: &mut Cube) -> bool {
        let whole = volume(first, cumulative, self.side);
        let mut best = [(0.0, None); 4];
        for dir in [ALPHA, RED, GREEN, BLUE] {
            best[dir] = self.maximize(cumulative, first, dir, &whole);
        }

        let max_of = |d: usize| best[d].0;
        let dir = if max_of(ALPHA) >= max_of(RED)
            && max_of(ALPHA) >= max_of(GREEN)
            && max_of(ALPHA) >= max_of(BLUE)
        {
            ALPHA
        } else if max_of(RED) >= max_of(GREEN) && max_of(RED) >= max_of(BLUE) {
            RED
        } else if max_of(GREEN) >= max_of(BLUE) {
            GREEN
        } else {
            BLUE
        };
        let Some(position) = best[dir].1 else {
            return false;
        };

        second.max = first.max;
        second.min = first.min;
        second.min[dir] = position;
        first.max[dir] = position;
        true
    }

    /// Best cut position along `dir` and the between-halves score.
    fn maximize(
        &self,
        cumulative: &[Moment],
        cube: &Cube,
        dir: usize,
        whole: &Moment,
    ) -> (f64, Option<usize>) {
        let base = bottom(cube, dir, cumulative, self.side);
        let mut result = 0.0;
        let mut cut = None;
        for position in cube.min[dir] + 1..cube.max[dir] {
            let mut half = base;
            half.add(&top(cube, dir, position, cumulative, self.side));
            if half.weight == 0.0 {
                continue;
            }
            let mut score = half.channel_sq() / half.weight;
            let rest = whole.sub(&half);
            if rest.weight == 0.0 {
                continue;
            }
            score += rest.channel_sq() / rest.weight;
            if score > result {
                result = score;
                cut = Some(position);
            }
        }
        (result, cut)
    }
}

/// Inclusion-exclusion over the 16 box corners. `pick(axis, is_min)`
/// gives the coordinate for that corner, or `None` to skip the corner.
fn corners(
    cumulative: &[Moment],
    side: usize,
    pick: impl Fn(usize, bool) -> Option<usize>,
) -> Moment {
    let mut total = Moment::default();
    'corner: for mask in 0..16usize {
        let mut coord = [0usize; 4];
        let mut minima = 0;
        for d in 0..4 {
            let use_min = mask & (1 << d) != 0;
            let Some(c) = pick(d, use_min) else {
                continue 'corner;
            };
            coord[d] = c;
            if use_min {
                minima += 1;
            }
        }
        let idx = ((coord[ALPHA] * side + coord[RED]) * side + coord[GREEN]) * side + coord[BLUE];
        let sign = if minima % 2 == 0 { 1.0 } else { -1.0 };
        total.scaled_add(&cumulative[idx], sign);
    }
    total
}

/// Moments of everything inside `cube`.
fn volume(cube: &Cube, cumulative: &[Moment], side: usize) -> Moment {
    corners(cumulative, side, |d, use_min| {
        Some(if use_min { cube.min[d] } else { cube.max[d] })
    })
}

/// Corner terms of `cube` lying on its lower face along `dir`.
fn bottom(cube: &Cube, dir: usize, cumulative: &[Moment], side: usize) -> Moment {
    corners(cumulative, side, |d, use_min| {
        if d == dir {
            use_min.then_some(cube.min[d])
        } else {
            Some(if use_min { cube.min[d] } else { cube.max[d] })
        }
    })
}

/// Corner terms of `cube` with its upper face along `dir` moved to `position`.
fn top(cube: &Cube, dir: usize, position: usize, cumulative: &[Moment], side: usize) -> Moment {
    corners(cumulative, side, |d, use_min| {
        if d == dir {
            (!use_min).then_some(position)
        } else {
            Some(if use_min { cube.min[d] } else { cube.max[d] })
        }
    })
}

fn variance(cube: &Cube, cumulative: &[Moment], side: usize) -> f64 {
    let m = volume(cube, cumulative, side);
    if m.weight == 0.0 {
        return 0.0;
    }
    m.sq - m.channel_sq() / m.weight
}
