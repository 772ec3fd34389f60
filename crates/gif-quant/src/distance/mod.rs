//! Color distance metrics.
//!
//! Every quantizer and every nearest-color search goes through a
//! [`ColorDistance`]. A metric instance is calibrated once at construction:
//! the raw distance between the configured white point and transparent black
//! becomes the normalization constant, so [`ColorDistance::normalized`]
//! returns values in `0.0..=1.0` for the channel-wise families. The CIE94
//! textiles weights halve lightness, so strongly saturated pairs can land
//! above 1.0 there.
//!
//! The Euclidean and Manhattan families work directly on weighted channel
//! differences. The CIE family converts to Lab first and adds a separately
//! weighted alpha term, so transparency still takes part in matching.

mod cie;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::{Lab, Rgba};

pub use cie::{ciede2000_squared, cie94_squared, Cie94Weights, CIE94_GRAPHIC_ARTS, CIE94_TEXTILES};

const BT709: [f64; 4] = [0.2126, 0.7152, 0.0722, 1.0];
const NOMMYDE: [f64; 4] = [0.4984, 0.8625, 0.2979, 1.0];

/// The available distance formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMetric {
    /// Plain Euclidean distance over RGBA
    Euclidean,
    /// Euclidean distance with BT.709 luma weights
    #[default]
    EuclideanBt709,
    /// BT.709-weighted Euclidean distance ignoring alpha
    EuclideanBt709NoAlpha,
    /// Sum of absolute channel differences
    Manhattan,
    /// Manhattan distance with BT.709 luma weights
    ManhattanBt709,
    /// Manhattan distance with Nommyde's weights
    ManhattanNommyde,
    /// CIE94, textiles application weights
    Cie94Textiles,
    /// CIE94, graphic arts application weights
    Cie94GraphicArts,
    /// CIEDE2000
    Ciede2000,
}

impl DistanceMetric {
    /// All metrics, in declaration order.
    pub const ALL: [DistanceMetric; 9] = [
        DistanceMetric::Euclidean,
        DistanceMetric::EuclideanBt709,
        DistanceMetric::EuclideanBt709NoAlpha,
        DistanceMetric::Manhattan,
        DistanceMetric::ManhattanBt709,
        DistanceMetric::ManhattanNommyde,
        DistanceMetric::Cie94Textiles,
        DistanceMetric::Cie94GraphicArts,
        DistanceMetric::Ciede2000,
    ];

    /// The kebab-case name used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::EuclideanBt709 => "euclidean-bt709",
            DistanceMetric::EuclideanBt709NoAlpha => "euclidean-bt709-no-alpha",
            DistanceMetric::Manhattan => "manhattan",
            DistanceMetric::ManhattanBt709 => "manhattan-bt709",
            DistanceMetric::ManhattanNommyde => "manhattan-nommyde",
            DistanceMetric::Cie94Textiles => "cie94-textiles",
            DistanceMetric::Cie94GraphicArts => "cie94-graphic-arts",
            DistanceMetric::Ciede2000 => "ciede2000",
        }
    }

    /// Default per-channel weights. For the CIE family only the alpha
    /// weight is used.
    fn default_weights(self) -> [f64; 4] {
        match self {
            DistanceMetric::Euclidean | DistanceMetric::Manhattan => [1.0; 4],
            DistanceMetric::EuclideanBt709 | DistanceMetric::ManhattanBt709 => BT709,
            DistanceMetric::EuclideanBt709NoAlpha => [BT709[0], BT709[1], BT709[2], 0.0],
            DistanceMetric::ManhattanNommyde => NOMMYDE,
            DistanceMetric::Cie94Textiles => [0.0, 0.0, 0.0, 0.25 * 50.0 / 255.0],
            DistanceMetric::Cie94GraphicArts | DistanceMetric::Ciede2000 => {
                [0.0, 0.0, 0.0, 0.25 * 100.0 / 255.0]
            }
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown metric name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown distance metric '{0}'")]
pub struct UnknownMetric(pub String);

impl FromStr for DistanceMetric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        DistanceMetric::ALL
            .into_iter()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// A calibrated distance function.
///
/// Cheap to copy; workers each hold their own instance.
///
/// # Example
/// ```
/// use gif_quant::{ColorDistance, DistanceMetric, Rgba};
///
/// let d = ColorDistance::new(DistanceMetric::Euclidean);
/// let black = Rgba::opaque(0, 0, 0);
/// assert_eq!(d.distance(black, black), 0.0);
/// assert!(d.normalized(black, Rgba::opaque(255, 255, 255)) <= 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorDistance {
    metric: DistanceMetric,
    weights: [f64; 4],
    /// `255 / white_point` per channel
    scale: [f64; 4],
    max_distance: f64,
}

impl ColorDistance {
    /// Metric at the default white point of 255 on every channel.
    pub fn new(metric: DistanceMetric) -> Self {
        Self::with_white_point(metric, [255.0; 4])
    }

    /// Metric whose channel maxima are `white_point` instead of 255.
    ///
    /// The neural quantizer works in a `255 << 3` fixed-point space and
    /// calibrates its metric accordingly. Non-positive entries fall back
    /// to 255.
    pub fn with_white_point(metric: DistanceMetric, white_point: [f64; 4]) -> Self {
        let mut scale = [1.0; 4];
        for (s, wp) in scale.iter_mut().zip(white_point) {
            *s = if wp > 0.0 { 255.0 / wp } else { 1.0 };
        }
        let mut this = Self {
            metric,
            weights: metric.default_weights(),
            scale,
            max_distance: 1.0,
        };
        this.calibrate(white_point);
        this
    }

    /// Override the alpha weight and recalibrate.
    pub fn with_alpha_weight(mut self, weight: f64) -> Self {
        self.weights[3] = weight.max(0.0);
        let white_point = self.white_point();
        self.calibrate(white_point);
        self
    }

    fn white_point(&self) -> [f64; 4] {
        self.scale.map(|s| 255.0 / s)
    }

    fn calibrate(&mut self, white_point: [f64; 4]) {
        let max = self.raw(white_point, [0.0; 4]);
        self.max_distance = if max > 0.0 { max } else { 1.0 };
    }

    /// The formula in use.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// The alpha weight in use.
    pub fn alpha_weight(&self) -> f64 {
        self.weights[3]
    }

    /// Normalization constant (raw distance from white point to transparent black).
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Raw distance between two colors given as float channels in
    /// `0..=white_point`.
    pub fn raw(&self, a: [f64; 4], b: [f64; 4]) -> f64 {
        let w = &self.weights;
        match self.metric {
            DistanceMetric::Euclidean
            | DistanceMetric::EuclideanBt709
            | DistanceMetric::EuclideanBt709NoAlpha => {
                let mut sum = 0.0;
                for i in 0..4 {
                    let d = b[i] - a[i];
                    sum += w[i] * d * d;
                }
                sum.sqrt()
            }
            DistanceMetric::Manhattan
            | DistanceMetric::ManhattanBt709
            | DistanceMetric::ManhattanNommyde => {
                let mut sum = 0.0;
                for i in 0..4 {
                    sum += w[i] * (b[i] - a[i]).abs();
                }
                sum
            }
            DistanceMetric::Cie94Textiles => self.cie94(a, b, &CIE94_TEXTILES),
            DistanceMetric::Cie94GraphicArts => self.cie94(a, b, &CIE94_GRAPHIC_ARTS),
            DistanceMetric::Ciede2000 => {
                let (lab1, lab2) = (self.to_lab(a), self.to_lab(b));
                let da = self.alpha_term(a, b);
                (ciede2000_squared(&lab1, &lab2) + da * da).sqrt()
            }
        }
    }

    fn cie94(&self, a: [f64; 4], b: [f64; 4], weights: &Cie94Weights) -> f64 {
        let (lab1, lab2) = (self.to_lab(a), self.to_lab(b));
        let da = self.alpha_term(a, b);
        (cie94_squared(&lab1, &lab2, weights) + da * da).sqrt()
    }

    fn to_lab(&self, c: [f64; 4]) -> Lab {
        let ch = |i: usize| (c[i] * self.scale[i]).clamp(0.0, 255.0);
        Lab::from_srgb(ch(0), ch(1), ch(2))
    }

    fn alpha_term(&self, a: [f64; 4], b: [f64; 4]) -> f64 {
        (b[3] - a[3]) * self.scale[3] * self.weights[3]
    }

    /// Raw distance between two colors.
    #[inline]
    pub fn distance(&self, a: Rgba, b: Rgba) -> f64 {
        self.raw(a.channels(), b.channels())
    }

    /// Raw distance divided by the calibration maximum.
    #[inline]
    pub fn normalized_raw(&self, a: [f64; 4], b: [f64; 4]) -> f64 {
        self.raw(a, b) / self.max_distance
    }

    /// Raw distance over the calibration maximum.
    #[inline]
    pub fn normalized(&self, a: Rgba, b: Rgba) -> f64 {
        self.normalized_raw(a.channels(), b.channels())
    }
}

impl Default for ColorDistance {
    fn default() -> Self {
        Self::new(DistanceMetric::default())
    }
}
