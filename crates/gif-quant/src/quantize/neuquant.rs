//! NeuQuant neural-net quantizer (Anthony Dekker, 1994), RGBA variant.
//!
//! A one-dimensional self-organizing map of `target` neurons is trained on
//! the sampled pixels in a `<< 3` fixed-point space. The winner of a biased
//! contest and its neighbours within a shrinking radius are pulled toward
//! each sample.

use super::QuantizeError;
use crate::color::Rgba;
use crate::distance::{ColorDistance, DistanceMetric};
use crate::frame::Frame;

const PRIME1: usize = 499;
const PRIME2: usize = 491;
const PRIME3: usize = 487;
const PRIME4: usize = 503;
const MIN_PICTURE_BYTES: usize = PRIME4;

const N_CYCLES: usize = 100;
const NETWORK_BIAS_SHIFT: u32 = 3;

const INITIAL_BIAS_SHIFT: u32 = 16;
const INITIAL_BIAS: i64 = 1 << INITIAL_BIAS_SHIFT;
const GAMMA_SHIFT: u32 = 10;
const BETA_SHIFT: u32 = 10;
const BETA: i64 = INITIAL_BIAS >> BETA_SHIFT;
const BETA_GAMMA: i64 = INITIAL_BIAS << (GAMMA_SHIFT - BETA_SHIFT);

const RADIUS_BIAS_SHIFT: u32 = 6;
const RADIUS_BIAS: i64 = 1 << RADIUS_BIAS_SHIFT;
const RADIUS_DECREASE: i64 = 30;

const INIT_ALPHA: i64 = 1 << 10;
const RAD_BIAS: f64 = (1 << 8) as f64;
const ALPHA_RAD_BIAS: f64 = (1 << 18) as f64;

/// Fixed-point channel maximum the metric is calibrated against.
const WHITE_POINT: f64 = (255 << NETWORK_BIAS_SHIFT) as f64;

#[derive(Debug, Clone, Copy)]
struct Neuron {
    r: f64,
    g: f64,
    b: f64,
    a: f64,
}

impl Neuron {
    fn splat(v: f64) -> Self {
        Self { r: v, g: v, b: v, a: v }
    }

    #[inline]
    fn channels(&self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Move toward `target` by `factor`, truncating each step like the
    /// integer original.
    #[inline]
    fn pull(&mut self, factor: f64, target: &[f64; 4]) {
        self.r -= (factor * (self.r - target[0])).trunc();
        self.g -= (factor * (self.g - target[1])).trunc();
        self.b -= (factor * (self.b - target[2])).trunc();
        self.a -= (factor * (self.a - target[3])).trunc();
    }

    fn to_rgba(self) -> Rgba {
        let ch = |v: f64| ((v as i64) >> NETWORK_BIAS_SHIFT).clamp(0, 255) as u8;
        Rgba::new(ch(self.r), ch(self.g), ch(self.b), ch(self.a))
    }
}

/// Self-organizing map quantizer.
#[derive(Debug, Clone)]
pub struct NeuQuant {
    distance: ColorDistance,
    pixels: Vec<Rgba>,
}

impl NeuQuant {
    /// Create a quantizer. The metric is recalibrated for the fixed-point
    /// network space.
    pub fn new(distance: ColorDistance) -> Self {
        let metric: DistanceMetric = distance.metric();
        let distance = ColorDistance::with_white_point(metric, [WHITE_POINT; 4])
            .with_alpha_weight(distance.alpha_weight());
        Self {
            distance,
            pixels: Vec::new(),
        }
    }

    pub fn sample(&mut self, frame: &Frame) {
        self.pixels.extend(frame.pixels());
    }

    pub(crate) fn build_colors(&mut self, target: usize) -> Result<Vec<Rgba>, QuantizeError> {
        if self.pixels.is_empty() {
            return Err(QuantizeError::EmptySample);
        }
        let mut net = Network::new(target, &self.distance);
        net.learn(&self.pixels);
        Ok(net.neurons.iter().map(|n| n.to_rgba()).collect())
    }
}

struct Network<'a> {
    distance: &'a ColorDistance,
    neurons: Vec<Neuron>,
    freq: Vec<i64>,
    bias: Vec<i64>,
    rad_power: Vec<f64>,
}

impl<'a> Network<'a> {
    fn new(size: usize, distance: &'a ColorDistance) -> Self {
        let neurons = (0..size)
            .map(|i| Neuron::splat(((i << (NETWORK_BIAS_SHIFT + 8)) as f64) / size as f64))
            .collect();
        Self {
            distance,
            neurons,
            freq: vec![INITIAL_BIAS / size as i64; size],
            bias: vec![0; size],
            rad_power: Vec::new(),
        }
    }

    fn update_rad_power(&mut self, alpha: i64, rad: i64) {
        self.rad_power.clear();
        let rad_sq = (rad * rad) as f64;
        for i in 0..rad {
            let falloff = ((rad * rad - i * i) as f64 * RAD_BIAS) / rad_sq;
            self.rad_power.push(alpha as f64 * falloff);
        }
    }

    fn learn(&mut self, pixels: &[Rgba]) {
        let count = pixels.len();
        let sample_factor = 1usize;
        let alphadec = 30 + (sample_factor as i64 - 1) / 3;
        let points_to_sample = count / sample_factor;
        let delta = (points_to_sample / N_CYCLES).max(1);

        let mut alpha = INIT_ALPHA;
        let mut radius = (self.neurons.len() as i64 >> 3) * RADIUS_BIAS;
        let mut rad = shrink(radius);
        self.update_rad_power(alpha, rad);

        let step = if count < MIN_PICTURE_BYTES {
            1
        } else if count % PRIME1 != 0 {
            PRIME1
        } else if count % PRIME2 != 0 {
            PRIME2
        } else if count % PRIME3 != 0 {
            PRIME3
        } else {
            PRIME4
        };

        let mut pos = 0usize;
        for i in 1..=points_to_sample {
            let px = pixels[pos];
            let target = px.channels().map(|c| c * (1 << NETWORK_BIAS_SHIFT) as f64);

            let winner = self.contest(&target);
            self.alter_single(alpha, winner, &target);
            if rad != 0 {
                self.alter_neighbours(rad, winner, &target);
            }

            pos += step;
            if pos >= count {
                pos -= count;
            }

            if i % delta == 0 {
                alpha -= alpha / alphadec;
                radius -= radius / RADIUS_DECREASE;
                rad = shrink(radius);
                self.update_rad_power(alpha, rad);
            }
        }
    }

    /// Biased competition; returns the index of the neuron to train.
    fn contest(&mut self, target: &[f64; 4]) -> usize {
        let mut best_dist = i64::MAX;
        let mut best_bias_dist = i64::MAX;
        let mut best_pos = 0;
        let mut best_bias_pos = 0;

        for i in 0..self.neurons.len() {
            let n = self.distance.normalized_raw(self.neurons[i].channels(), *target);
            let dist = (n * WHITE_POINT) as i64;
            if dist < best_dist {
                best_dist = dist;
                best_pos = i;
            }
            let bias_dist = dist - (self.bias[i] >> (INITIAL_BIAS_SHIFT - NETWORK_BIAS_SHIFT));
            if bias_dist < best_bias_dist {
                best_bias_dist = bias_dist;
                best_bias_pos = i;
            }
            let beta_freq = self.freq[i] >> BETA_SHIFT;
            self.freq[i] -= beta_freq;
            self.bias[i] += beta_freq << GAMMA_SHIFT;
        }
        self.freq[best_pos] += BETA;
        self.bias[best_pos] -= BETA_GAMMA;
        best_bias_pos
    }

    fn alter_single(&mut self, alpha: i64, i: usize, target: &[f64; 4]) {
        let factor = alpha as f64 / INIT_ALPHA as f64;
        self.neurons[i].pull(factor, target);
    }

    fn alter_neighbours(&mut self, rad: i64, i: usize, target: &[f64; 4]) {
        let size = self.neurons.len() as i64;
        let center = i as i64;
        let lo = (center - rad).max(-1);
        let hi = (center + rad).min(size);

        let mut j = center + 1;
        let mut k = center - 1;
        let mut m = 1usize;
        while j < hi || k > lo {
            let factor = self.rad_power[m] / ALPHA_RAD_BIAS;
            m += 1;
            if j < hi {
                self.neurons[j as usize].pull(factor, target);
                j += 1;
            }
            if k > lo {
                self.neurons[k as usize].pull(factor, target);
                k -= 1;
            }
        }
    }
}

/// Neighbourhood radius from the biased radius; radii of 1 or less
/// disable neighbour training.
fn shrink(radius: i64) -> i64 {
    let rad = radius >> RADIUS_BIAS_SHIFT;
    if rad <= 1 {
        0
    } else {
        rad
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Frame {
        let pixels: Vec<Rgba> = (0..width * height)
            .map(|i| {
                let x = (i % width) * 255 / (width - 1);
                let y = (i / width) * 255 / (height - 1);
                Rgba::opaque(x as u8, y as u8, 128)
            })
            .collect();
        Frame::from_pixels(width, height, &pixels).unwrap()
    }

    #[test]
    fn test_network_initialized_on_diagonal() {
        let d = ColorDistance::default();
        let net = Network::new(4, &d);
        let firsts: Vec<f64> = net.neurons.iter().map(|n| n.r).collect();
        assert_eq!(firsts, vec![0.0, 512.0, 1024.0, 1536.0]);
        assert_eq!(net.freq, vec![INITIAL_BIAS / 4; 4]);
    }

    #[test]
    fn test_shrink_disables_small_radius() {
        assert_eq!(shrink(64), 0);
        assert_eq!(shrink(127), 0);
        assert_eq!(shrink(128), 2);
        assert_eq!(shrink(32 * 64), 32);
    }

    #[test]
    fn test_produces_target_neurons() {
        let mut q = NeuQuant::new(ColorDistance::new(DistanceMetric::Euclidean));
        q.sample(&gradient(32, 32));
        let colors = q.build_colors(16).unwrap();
        assert_eq!(colors.len(), 16);
        // Small samples leave some diagonal neurons untrained
        let trained = colors.iter().filter(|c| c.a >= 250).count();
        assert!(trained >= 8, "only {trained} trained neurons: {colors:?}");
    }

    #[test]
    fn test_learns_two_clusters() {
        let mut pixels = vec![Rgba::opaque(250, 20, 20); 600];
        pixels.extend(vec![Rgba::opaque(20, 20, 250); 600]);
        let frame = Frame::from_pixels(40, 30, &pixels).unwrap();
        let mut q = NeuQuant::new(ColorDistance::new(DistanceMetric::Euclidean));
        q.sample(&frame);
        let colors = q.build_colors(2).unwrap();
        let d = ColorDistance::new(DistanceMetric::Euclidean);
        for target in [Rgba::opaque(250, 20, 20), Rgba::opaque(20, 20, 250)] {
            let closest = colors
                .iter()
                .map(|c| d.distance(*c, target))
                .fold(f64::INFINITY, f64::min);
            assert!(closest < 40.0, "no neuron near {target}: {colors:?}");
        }
    }

    #[test]
    fn test_deterministic() {
        let frame = gradient(24, 24);
        let run = || {
            let mut q = NeuQuant::new(ColorDistance::default());
            q.sample(&frame);
            q.build_colors(8).unwrap()
        };
        assert_eq!(run(), run());
    }
}
