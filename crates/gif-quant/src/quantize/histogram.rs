//! Color histograms with per-hue representation tracking.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::color::{hue_group, Hsl, Rgba};
use crate::frame::Frame;
use crate::palette::MAX_PALETTE_SIZE;

const HUE_GROUPS: u32 = 10;
const BOX_SIZE: u32 = 64;
const BOX_PIXELS: f64 = 2.0;

/// Upper bound on colors remembered per hue group.
const MAX_HUE_COLS: usize = MAX_PALETTE_SIZE << 2;

/// How pixels enter the histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistogramMethod {
    /// Count every pixel; keep the top `4 × target` colors plus ties
    Global,
    /// Count a color only once it repeats within a 64×64 box
    #[default]
    Spatial,
}

#[derive(Debug, Clone, Default)]
struct HueGroup {
    num: usize,
    cols: Vec<u32>,
}

/// Occurrence counts per hue group, with the first colors seen in each.
///
/// Groups that stay rare are injected into the histogram so that every hue
/// present in the image keeps a chance of reaching the palette.
#[derive(Debug, Clone)]
struct HueStatistics {
    groups: Vec<HueGroup>,
}

impl HueStatistics {
    fn new() -> Self {
        Self {
            groups: vec![HueGroup::default(); HUE_GROUPS as usize + 1],
        }
    }

    fn check(&mut self, packed: u32) {
        let c = Rgba::from_packed(packed);
        let group = if c.r == c.g && c.g == c.b {
            0
        } else {
            1 + hue_group(Hsl::from(c).h, HUE_GROUPS) as usize
        };
        let g = &mut self.groups[group];
        g.num += 1;
        if g.num <= MAX_HUE_COLS {
            g.cols.push(packed);
        }
    }

    /// Colors of groups seen at most `min_cols` times.
    fn underrepresented(&self, min_cols: usize) -> impl Iterator<Item = u32> + '_ {
        self.groups
            .iter()
            .filter(move |g| g.num <= min_cols)
            .flat_map(move |g| g.cols.iter().take(min_cols).copied())
    }
}

/// Accumulated color counts keyed by packed RGBA.
#[derive(Debug, Clone)]
pub(crate) struct ColorHistogram {
    method: HistogramMethod,
    counts: BTreeMap<u32, u64>,
    hue_stats: HueStatistics,
    /// Frames seen by spatial sampling; each one injects rare hues once
    spatial_frames: usize,
}

impl ColorHistogram {
    pub(crate) fn new(method: HistogramMethod) -> Self {
        Self {
            method,
            counts: BTreeMap::new(),
            hue_stats: HueStatistics::new(),
            spatial_frames: 0,
        }
    }

    pub(crate) fn sample(&mut self, frame: &Frame) {
        match self.method {
            HistogramMethod::Global => self.sample_global(frame),
            HistogramMethod::Spatial => self.sample_spatial(frame),
        }
    }

    fn sample_global(&mut self, frame: &Frame) {
        for px in frame.pixels() {
            let col = px.packed();
            self.hue_stats.check(col);
            *self.counts.entry(col).or_insert(0) += 1;
        }
    }

    fn sample_spatial(&mut self, frame: &Frame) {
        let (width, height) = (frame.width(), frame.height());
        let area = (BOX_SIZE * BOX_SIZE) as f64;
        for (bx, by, bw, bh) in make_boxes(width, height, BOX_SIZE, BOX_SIZE) {
            let effc = (((bw * bh) as f64 / area).round() * BOX_PIXELS).max(2.0) as u64;
            let mut local: HashMap<u32, u64> = HashMap::new();
            for y in by..by + bh {
                for x in bx..bx + bw {
                    let col = frame.pixel_at(x, y).packed();
                    self.hue_stats.check(col);
                    if let Some(count) = self.counts.get_mut(&col) {
                        *count += 1;
                    } else {
                        let count = local.entry(col).or_insert(0);
                        *count += 1;
                        if *count >= effc {
                            self.counts.insert(col, *count);
                        }
                    }
                }
            }
        }
        // Injection depends on the target, so it happens at sort time
        self.spatial_frames += 1;
    }

    /// Colors ordered by descending count, ties by ascending packed value,
    /// with under-represented hues added.
    ///
    /// When spatial sampling found no repeated color at all (pure noise),
    /// the first colors recorded per hue group stand in for the histogram.
    pub(crate) fn importance_sorted(&self, target_colors: usize) -> Vec<u32> {
        let sorted = self.sorted_with_injections(target_colors);
        if !sorted.is_empty() {
            return sorted;
        }
        let mut seen = HashSet::new();
        self.hue_stats
            .underrepresented(usize::MAX)
            .filter(|c| seen.insert(*c))
            .collect()
    }

    fn sorted_with_injections(&self, target_colors: usize) -> Vec<u32> {
        let min_cols = target_colors << 2;
        match self.method {
            HistogramMethod::Global => {
                let sorted = sort_by_count(&self.counts);
                if sorted.is_empty() {
                    return sorted;
                }
                let limit = sorted.len().min(min_cols);
                let last_freq = self.counts[&sorted[limit - 1]];
                let mut colors: Vec<u32> = sorted[..limit].to_vec();
                colors.extend(
                    sorted[limit..]
                        .iter()
                        .take_while(|c| self.counts[*c] == last_freq)
                        .copied(),
                );
                let mut present: HashSet<u32> = colors.iter().copied().collect();
                for col in self.hue_stats.underrepresented(min_cols) {
                    if present.insert(col) {
                        colors.push(col);
                    }
                }
                colors
            }
            HistogramMethod::Spatial => {
                let mut counts = self.counts.clone();
                for _ in 0..self.spatial_frames {
                    for col in self.hue_stats.underrepresented(min_cols) {
                        *counts.entry(col).or_insert(0) += 1;
                    }
                }
                sort_by_count(&counts)
            }
        }
    }
}

fn sort_by_count(counts: &BTreeMap<u32, u64>) -> Vec<u32> {
    // BTreeMap iterates keys ascending; the stable sort keeps that for ties
    let mut sorted: Vec<u32> = counts.keys().copied().collect();
    sorted.sort_by(|a, b| counts[b].cmp(&counts[a]));
    sorted
}

/// Tile a `width × height` area into boxes, the last row and column
/// taking the remainder.
fn make_boxes(width: u32, height: u32, step_x: u32, step_y: u32) -> Vec<(u32, u32, u32, u32)> {
    let (wrem, hrem) = (width % step_x, height % step_y);
    let (xend, yend) = (width - wrem, height - hrem);
    let mut boxes = Vec::new();
    for y in (0..height).step_by(step_y as usize) {
        for x in (0..width).step_by(step_x as usize) {
            let w = if x == xend { wrem } else { step_x };
            let h = if y == yend { hrem } else { step_y };
            boxes.push((x, y, w, h));
        }
    }
    boxes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_boxes_covers_remainders() {
        let boxes = make_boxes(130, 64, 64, 64);
        assert_eq!(boxes, vec![(0, 0, 64, 64), (64, 0, 64, 64), (128, 0, 2, 64)]);
        assert_eq!(make_boxes(1, 1, 64, 64), vec![(0, 0, 1, 1)]);
    }

    #[test]
    fn test_spatial_ignores_singletons() {
        let mut pixels = vec![Rgba::opaque(10, 10, 10); 15];
        pixels.push(Rgba::opaque(200, 200, 200));
        let frame = Frame::from_pixels(4, 4, &pixels).unwrap();
        let mut hist = ColorHistogram::new(HistogramMethod::Spatial);
        hist.sample(&frame);
        // Grey group was seen 16 times, above 4 × 2, so nothing is injected
        assert_eq!(hist.importance_sorted(2), vec![Rgba::opaque(10, 10, 10).packed()]);
    }

    #[test]
    fn test_spatial_injects_rare_hues() {
        let mut pixels = vec![Rgba::opaque(10, 10, 10); 15];
        pixels.push(Rgba::opaque(0, 0, 255));
        let frame = Frame::from_pixels(4, 4, &pixels).unwrap();
        let mut hist = ColorHistogram::new(HistogramMethod::Spatial);
        hist.sample(&frame);
        let sorted = hist.importance_sorted(2);
        assert_eq!(sorted[0], Rgba::opaque(10, 10, 10).packed());
        assert!(sorted.contains(&Rgba::opaque(0, 0, 255).packed()));
    }

    #[test]
    fn test_global_orders_by_count_then_key() {
        let pixels = [
            Rgba::opaque(5, 5, 5),
            Rgba::opaque(1, 1, 1),
            Rgba::opaque(5, 5, 5),
            Rgba::opaque(3, 3, 3),
        ];
        let frame = Frame::from_pixels(2, 2, &pixels).unwrap();
        let mut hist = ColorHistogram::new(HistogramMethod::Global);
        hist.sample(&frame);
        assert_eq!(
            hist.importance_sorted(2),
            vec![
                Rgba::opaque(5, 5, 5).packed(),
                Rgba::opaque(1, 1, 1).packed(),
                Rgba::opaque(3, 3, 3).packed(),
            ]
        );
    }

    #[test]
    fn test_global_keeps_ties_past_limit() {
        // 10 colors, each once: limit is 4 × 2 = 8 but the tie pulls all in
        let pixels: Vec<Rgba> = (0..10u8).map(|v| Rgba::opaque(v, v, v)).collect();
        let frame = Frame::from_pixels(10, 1, &pixels).unwrap();
        let mut hist = ColorHistogram::new(HistogramMethod::Global);
        hist.sample(&frame);
        assert_eq!(hist.importance_sorted(2).len(), 10);
    }
}
