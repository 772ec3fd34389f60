//! Histogram-reduction quantizer.
//!
//! Colors are ranked by frequency, then near-duplicates are merged under a
//! growing distance threshold until the target count is reached.

use super::histogram::{ColorHistogram, HistogramMethod};
use super::QuantizeError;
use crate::color::Rgba;
use crate::distance::ColorDistance;
use crate::frame::Frame;

const INITIAL_THRESHOLD: f64 = 0.01;
const THRESHOLD_INCREMENT: f64 = 0.005;

#[derive(Debug, Clone, Copy)]
struct RemovedColor {
    index: usize,
    distance: f64,
}

/// Frequency-ranked histogram reduction.
#[derive(Debug, Clone)]
pub struct RgbQuant {
    distance: ColorDistance,
    histogram: ColorHistogram,
    sampled: bool,
}

impl RgbQuant {
    pub fn new(distance: ColorDistance, method: HistogramMethod) -> Self {
        Self {
            distance,
            histogram: ColorHistogram::new(method),
            sampled: false,
        }
    }

    pub fn sample(&mut self, frame: &Frame) {
        self.histogram.sample(frame);
        self.sampled = true;
    }

    pub(crate) fn build_colors(&mut self, target: usize) -> Result<Vec<Rgba>, QuantizeError> {
        if !self.sampled {
            return Err(QuantizeError::EmptySample);
        }
        let colors: Vec<Rgba> = self
            .histogram
            .importance_sorted(target)
            .into_iter()
            .map(Rgba::from_packed)
            .collect();
        if colors.is_empty() {
            return Err(QuantizeError::EmptySample);
        }
        Ok(self.reduce(colors, target))
    }

    /// Merge colors closer than a rising threshold. Earlier (more frequent)
    /// colors absorb later ones.
    fn reduce(&self, colors: Vec<Rgba>, target: usize) -> Vec<Rgba> {
        let len = colors.len();
        let mut used = vec![true; len];
        let mut removed: Vec<RemovedColor> = Vec::new();
        let mut remaining = len;
        let mut threshold = INITIAL_THRESHOLD;

        while remaining > target {
            removed.clear();
            for i in 0..len {
                if !used[i] {
                    continue;
                }
                for j in i + 1..len {
                    if !used[j] {
                        continue;
                    }
                    let d = self.distance.normalized(colors[i], colors[j]);
                    if d < threshold {
                        removed.push(RemovedColor { index: j, distance: d });
                        used[j] = false;
                        remaining -= 1;
                    }
                }
            }
            threshold += if remaining > target * 3 {
                INITIAL_THRESHOLD
            } else {
                THRESHOLD_INCREMENT
            };
        }

        // The last pass may overshoot: bring back its most distinct removals
        if remaining < target {
            removed.sort_by(|a, b| b.distance.total_cmp(&a.distance));
            for r in removed.iter().take(target - remaining) {
                used[r.index] = true;
            }
        }

        colors
            .into_iter()
            .zip(used)
            .filter_map(|(c, keep)| keep.then_some(c))
            .collect()
    }
}
