//! Dithering options and configuration.

use serde::{Deserialize, Serialize};

/// Tuning shared by the dithering algorithms.
///
/// # Defaults
///
/// - Serpentine scanning: enabled
/// - Minimum color distance: 0.0 (always diffuse)
/// - GIMP-style error: disabled
/// - Riemersma queue: 16 entries at full propagation
///
/// # Example
///
/// ```
/// use gif_quant::DitherOptions;
///
/// let options = DitherOptions::new()
///     .serpentine(false)
///     .minimum_color_distance(0.02);
/// assert!(!options.serpentine);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DitherOptions {
    /// Alternate row direction, mirroring the kernel on right-to-left rows.
    ///
    /// Default: `true`
    pub serpentine: bool,

    /// Skip diffusion when the chosen color is within this normalized
    /// distance of the original pixel.
    ///
    /// Default: `0.0`
    pub minimum_color_distance: f64,

    /// Measure the residual from the error-corrected color instead of the
    /// original pixel, as GIMP does.
    ///
    /// Default: `false`
    pub gimp_error: bool,

    /// Length of the Riemersma error history.
    ///
    /// Default: `16`
    pub error_queue_size: usize,

    /// Scale applied to every Riemersma history weight.
    ///
    /// Default: `1.0`
    pub error_propagation: f64,
}

impl Default for DitherOptions {
    fn default() -> Self {
        Self {
            serpentine: true,
            minimum_color_distance: 0.0,
            gimp_error: false,
            error_queue_size: 16,
            error_propagation: 1.0,
        }
    }
}

impl DitherOptions {
    /// Create options with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn serpentine(mut self, enabled: bool) -> Self {
        self.serpentine = enabled;
        self
    }

    #[inline]
    pub fn minimum_color_distance(mut self, distance: f64) -> Self {
        self.minimum_color_distance = distance;
        self
    }

    #[inline]
    pub fn gimp_error(mut self, enabled: bool) -> Self {
        self.gimp_error = enabled;
        self
    }

    /// Set the Riemersma history length (at least 1).
    #[inline]
    pub fn error_queue_size(mut self, size: usize) -> Self {
        self.error_queue_size = size.max(1);
        self
    }

    #[inline]
    pub fn error_propagation(mut self, propagation: f64) -> Self {
        self.error_propagation = propagation;
        self
    }
}
