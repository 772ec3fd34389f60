//! Indexed color palette with nearest-color matching.

use std::collections::{HashMap, HashSet};

use super::error::PaletteError;
use crate::color::{hue_group, Hsl, Rgba};
use crate::distance::ColorDistance;

/// Maximum number of entries in a GIF color table.
pub const MAX_PALETTE_SIZE: usize = 256;

/// Hue buckets used by the palette sort key.
const SORT_HUE_GROUPS: u32 = 10;

/// An ordered GIF color table.
///
/// Invariants: between 2 and 256 entries, the length is a power of two and
/// no two entries are bit-identical. Palettes built by a quantizer are
/// sorted with [`sort_colors`]; palettes supplied by a caller keep the
/// caller's order.
///
/// # Example
///
/// ```
/// use gif_quant::{Palette, Rgba};
///
/// let palette = Palette::new(&[Rgba::opaque(0, 0, 0), Rgba::opaque(255, 255, 255)]).unwrap();
/// assert_eq!(palette.len(), 2);
/// assert_eq!(palette.bits(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Palette {
    colors: Vec<Rgba>,
}

impl Palette {
    /// Create a palette from exactly the given colors, in order.
    ///
    /// # Errors
    ///
    /// - [`PaletteError::EmptyPalette`] for an empty slice
    /// - [`PaletteError::InvalidSize`] if the length is not a power of two in `2..=256`
    /// - [`PaletteError::DuplicateColor`] if an entry repeats an earlier one
    pub fn new(colors: &[Rgba]) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::EmptyPalette);
        }
        if !is_valid_size(colors.len()) {
            return Err(PaletteError::InvalidSize(colors.len()));
        }
        let mut seen = HashSet::with_capacity(colors.len());
        for (index, c) in colors.iter().enumerate() {
            if !seen.insert(*c) {
                return Err(PaletteError::DuplicateColor { index });
            }
        }
        Ok(Self {
            colors: colors.to_vec(),
        })
    }

    /// Finish a quantizer's output: drop duplicates, sort, pad to a power
    /// of two with filler colors.
    pub fn from_quantized(colors: Vec<Rgba>) -> Result<Self, PaletteError> {
        let mut colors = dedup(colors);
        if colors.is_empty() {
            return Err(PaletteError::EmptyPalette);
        }
        if colors.len() > MAX_PALETTE_SIZE {
            return Err(PaletteError::InvalidSize(colors.len()));
        }
        sort_colors(&mut colors);
        pad_to_power_of_two(&mut colors);
        Ok(Self { colors })
    }

    /// Build from a list already known to be unique and correctly sized.
    pub(crate) fn from_unchecked(colors: Vec<Rgba>) -> Self {
        debug_assert!(is_valid_size(colors.len()));
        Self { colors }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color table size exponent: `len == 1 << bits`.
    #[inline]
    pub fn bits(&self) -> u8 {
        self.colors.len().trailing_zeros() as u8
    }

    /// The entries in table order.
    #[inline]
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    /// Entry at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Rgba> {
        self.colors.get(index).copied()
    }

    /// Index of a bit-identical entry.
    pub fn index_of(&self, color: Rgba) -> Option<usize> {
        self.colors.iter().position(|&c| c == color)
    }

    /// Replace the entry at `index`.
    ///
    /// # Errors
    ///
    /// [`PaletteError::DuplicateColor`] if `color` already sits at another index.
    ///
    /// # Panics
    ///
    /// If `index` is out of range.
    pub fn set(&mut self, index: usize, color: Rgba) -> Result<(), PaletteError> {
        if let Some(existing) = self.index_of(color) {
            if existing != index {
                return Err(PaletteError::DuplicateColor { index: existing });
            }
        }
        self.colors[index] = color;
        Ok(())
    }

    /// RGB triples for a GIF color table, `3 * len` bytes.
    pub fn rgb_bytes(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| c.rgb()).collect()
    }

    /// Index of the entry closest to `color`. Ties go to the lowest index.
    pub fn nearest(&self, color: Rgba, distance: &ColorDistance) -> usize {
        self.nearest_raw(color.channels(), distance)
    }

    /// [`nearest`](Self::nearest) for float channels, as produced during
    /// error diffusion.
    pub fn nearest_raw(&self, channels: [f64; 4], distance: &ColorDistance) -> usize {
        self.nearest_excluding(channels, distance, None)
    }

    /// [`nearest_raw`](Self::nearest_raw) that never returns `excluded`.
    ///
    /// A palette always has at least two entries, so some other index
    /// is always available.
    pub fn nearest_excluding(
        &self,
        channels: [f64; 4],
        distance: &ColorDistance,
        excluded: Option<usize>,
    ) -> usize {
        let mut best = usize::from(excluded == Some(0));
        let mut best_dist = f64::INFINITY;
        for (i, c) in self.colors.iter().enumerate() {
            if Some(i) == excluded {
                continue;
            }
            let d = distance.raw(channels, c.channels());
            if d < best_dist {
                best_dist = d;
                best = i;
            }
        }
        best
    }
}

/// Whether `len` is a legal GIF color table size.
#[inline]
pub fn is_valid_size(len: usize) -> bool {
    (2..=MAX_PALETTE_SIZE).contains(&len) && len.is_power_of_two()
}

/// Drop repeated colors, keeping the first occurrence.
pub(crate) fn dedup(colors: Vec<Rgba>) -> Vec<Rgba> {
    let mut seen = HashSet::with_capacity(colors.len());
    colors.into_iter().filter(|c| seen.insert(*c)).collect()
}

/// Append the lowest opaque colors not yet present until the length is a
/// power of two (and at least 2).
pub(crate) fn pad_to_power_of_two(colors: &mut Vec<Rgba>) {
    let target = colors.len().max(2).next_power_of_two();
    if colors.len() == target {
        return;
    }
    let present: HashSet<Rgba> = colors.iter().copied().collect();
    let mut candidate = 0u32;
    while colors.len() < target {
        let filler = Rgba::from_rgb_hex(candidate);
        if !present.contains(&filler) {
            colors.push(filler);
        }
        candidate += 1;
    }
}

/// Stable sort by hue group (greys first), then luminosity descending,
/// then saturation ascending. Repeated builds yield identical tables.
pub fn sort_colors(colors: &mut [Rgba]) {
    colors.sort_by_cached_key(|&c| {
        let hsl = Hsl::from(c);
        let group = if c.r == c.g && c.g == c.b {
            0
        } else {
            1 + hue_group(hsl.h, SORT_HUE_GROUPS)
        };
        // Luminosity is bounded, so its bit pattern orders like the value.
        let luminosity = c.luminosity(true).max(0.0);
        let saturation = (hsl.s * 100.0) as i32;
        (group, std::cmp::Reverse(luminosity.to_bits()), saturation)
    });
}

/// Nearest-color lookups with a per-color cache.
///
/// Frames usually repeat colors heavily, so caching by packed RGBA pays off
/// for plain nearest mapping and for ordered dithering alike.
#[derive(Debug)]
pub struct PaletteMatcher<'a> {
    palette: &'a Palette,
    distance: ColorDistance,
    excluded: Option<u8>,
    cache: HashMap<u32, u8>,
}

impl<'a> PaletteMatcher<'a> {
    /// Create a matcher for `palette` under `distance`.
    pub fn new(palette: &'a Palette, distance: ColorDistance) -> Self {
        Self {
            palette,
            distance,
            excluded: None,
            cache: HashMap::new(),
        }
    }

    /// Never match `index`. Used to keep opaque pixels off the
    /// transparency slot.
    pub fn excluding(mut self, index: Option<u8>) -> Self {
        self.excluded = index;
        self.cache.clear();
        self
    }

    /// The palette being matched against.
    pub fn palette(&self) -> &'a Palette {
        self.palette
    }

    /// The metric in use.
    pub fn distance(&self) -> &ColorDistance {
        &self.distance
    }

    /// Palette index closest to `color`.
    pub fn nearest(&mut self, color: Rgba) -> u8 {
        let palette = self.palette;
        let distance = &self.distance;
        let excluded = self.excluded.map(usize::from);
        *self.cache.entry(color.packed()).or_insert_with(|| {
            palette.nearest_excluding(color.channels(), distance, excluded) as u8
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMetric;

    #[test]
    fn test_new_rejects_bad_input() {
        assert_eq!(Palette::new(&[]), Err(PaletteError::EmptyPalette));
        let three = [Rgba::opaque(1, 0, 0), Rgba::opaque(2, 0, 0), Rgba::opaque(3, 0, 0)];
        assert_eq!(Palette::new(&three), Err(PaletteError::InvalidSize(3)));
        let dup = [Rgba::opaque(1, 0, 0), Rgba::opaque(1, 0, 0)];
        assert_eq!(
            Palette::new(&dup),
            Err(PaletteError::DuplicateColor { index: 1 })
        );
    }

    #[test]
    fn test_new_keeps_caller_order() {
        let colors = [Rgba::opaque(255, 255, 255), Rgba::opaque(0, 0, 0)];
        let palette = Palette::new(&colors).unwrap();
        assert_eq!(palette.colors(), &colors);
    }

    #[test]
    fn test_from_quantized_dedups_and_pads() {
        let palette = Palette::from_quantized(vec![
            Rgba::opaque(200, 10, 10),
            Rgba::opaque(200, 10, 10),
            Rgba::opaque(0, 0, 0),
        ])
        .unwrap();
        assert_eq!(palette.len(), 2);

        let palette = Palette::from_quantized(vec![
            Rgba::opaque(0, 0, 0),
            Rgba::opaque(9, 9, 9),
            Rgba::opaque(200, 10, 10),
        ])
        .unwrap();
        assert_eq!(palette.len(), 4);
        // The filler skips black because it is already present
        assert!(palette.index_of(Rgba::opaque(0, 0, 1)).is_some());
        let unique: HashSet<_> = palette.colors().iter().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_single_color_gets_padded_to_two() {
        let palette = Palette::from_quantized(vec![Rgba::opaque(5, 5, 5)]).unwrap();
        assert_eq!(palette.len(), 2);
    }

    #[test]
    fn test_sort_order() {
        let mut colors = vec![
            Rgba::opaque(0, 0, 255),
            Rgba::opaque(0, 0, 0),
            Rgba::opaque(255, 0, 0),
            Rgba::opaque(255, 255, 255),
            Rgba::opaque(128, 0, 0),
        ];
        sort_colors(&mut colors);
        assert_eq!(
            colors,
            vec![
                // greys, brightest first
                Rgba::opaque(255, 255, 255),
                Rgba::opaque(0, 0, 0),
                // red group, brightest first
                Rgba::opaque(255, 0, 0),
                Rgba::opaque(128, 0, 0),
                // blue
                Rgba::opaque(0, 0, 255),
            ]
        );
    }

    #[test]
    fn test_nearest_prefers_lowest_index_on_tie() {
        let palette = Palette::new(&[Rgba::opaque(0, 0, 0), Rgba::opaque(2, 2, 2)]).unwrap();
        let d = ColorDistance::new(DistanceMetric::Euclidean);
        assert_eq!(palette.nearest(Rgba::opaque(1, 1, 1), &d), 0);
        assert_eq!(palette.nearest(Rgba::opaque(2, 2, 3), &d), 1);
    }

    #[test]
    fn test_matcher_caches_results() {
        let palette = Palette::new(&[Rgba::opaque(0, 0, 0), Rgba::opaque(255, 255, 255)]).unwrap();
        let mut matcher = PaletteMatcher::new(&palette, ColorDistance::default());
        assert_eq!(matcher.nearest(Rgba::opaque(250, 250, 250)), 1);
        assert_eq!(matcher.nearest(Rgba::opaque(250, 250, 250)), 1);
        assert_eq!(matcher.nearest(Rgba::opaque(3, 3, 3)), 0);
        assert_eq!(matcher.cache.len(), 2);
    }

    #[test]
    fn test_matcher_skips_excluded_slot() {
        let palette = Palette::new(&[
            Rgba::opaque(0, 0, 1),
            Rgba::opaque(0, 0, 0),
            Rgba::opaque(255, 0, 0),
            Rgba::opaque(255, 255, 255),
        ])
        .unwrap();
        let mut matcher = PaletteMatcher::new(&palette, ColorDistance::default()).excluding(Some(0));
        assert_eq!(matcher.nearest(Rgba::opaque(0, 0, 1)), 1);
        assert_eq!(matcher.nearest(Rgba::opaque(0, 0, 0)), 1);
        assert_eq!(matcher.nearest(Rgba::opaque(250, 10, 10)), 2);

        let d = ColorDistance::default();
        let exact = Rgba::opaque(0, 0, 1).channels();
        assert_eq!(palette.nearest_excluding(exact, &d, None), 0);
        assert_eq!(palette.nearest_excluding(exact, &d, Some(0)), 1);
    }

    #[test]
    fn test_set_refuses_duplicates() {
        let mut palette =
            Palette::new(&[Rgba::opaque(0, 0, 0), Rgba::opaque(255, 255, 255)]).unwrap();
        assert!(palette.set(0, Rgba::opaque(255, 255, 255)).is_err());
        palette.set(0, Rgba::opaque(1, 2, 3)).unwrap();
        assert_eq!(palette.get(0), Some(Rgba::opaque(1, 2, 3)));
        assert_eq!(palette.rgb_bytes(), vec![1, 2, 3, 255, 255, 255]);
    }
}
