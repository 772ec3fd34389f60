//! HSL conversion and hue bucketing.

use super::rgba::Rgba;

/// Hue (degrees, `0..360`), saturation and lightness (`0..=1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl From<Rgba> for Hsl {
    fn from(c: Rgba) -> Self {
        let (r, g, b) = (c.r as f64, c.g as f64, c.b as f64);
        let min = r.min(g).min(b);
        let max = r.max(g).max(b);
        let delta = max - min;
        let l = (min + max) / 510.0;

        let mut s = 0.0;
        if l > 0.0 && l < 1.0 {
            s = delta / if l < 0.5 { max + min } else { 510.0 - max - min };
        }

        let mut h = 0.0;
        if delta > 0.0 {
            h = if max == r {
                (g - b) / delta
            } else if max == g {
                2.0 + (b - r) / delta
            } else {
                4.0 + (r - g) / delta
            };
            h *= 60.0;
            if h < 0.0 {
                h += 360.0;
            }
        }

        Self { h, s, l }
    }
}

/// Map a hue to one of `segments` buckets.
///
/// Bucket 0 is centered on red and wraps around 0°, so hues just below 360°
/// and just above 0° share it.
pub fn hue_group(hue: f64, segments: u32) -> u32 {
    let segment = 360.0 / segments as f64;
    let half = segment / 2.0;
    let mut mid = segment - half;
    for i in 1..segments {
        if hue >= mid && hue < mid + segment {
            return i;
        }
        mid += segment;
    }
    0
}
