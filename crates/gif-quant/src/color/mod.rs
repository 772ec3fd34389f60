//! Color types and conversions.
//!
//! - [`Rgba`]: 8-bit straight-alpha color, the unit every other module trades in
//! - [`Lab`]: CIE L*a*b* (D65), used by the perceptual distance metrics
//! - [`Hsl`]: hue/saturation/lightness, used for palette ordering and hue buckets
//!
//! # Example
//!
//! ```
//! use gif_quant::{Lab, Rgba};
//!
//! let red = Rgba::from_rgb_hex(0xFF0000);
//! assert_eq!(red.rgb(), [255, 0, 0]);
//!
//! let lab = Lab::from(red);
//! assert!(lab.l > 50.0 && lab.a > 70.0);
//! ```

mod hsl;
mod lab;
mod lut;
mod rgba;

pub use hsl::{hue_group, Hsl};
pub use lab::Lab;
pub use lut::srgb8_to_linear;
pub use rgba::Rgba;
