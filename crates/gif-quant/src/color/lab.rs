//! CIE L*a*b* conversion (D65 reference white).

use super::lut::srgb8_to_linear;
use super::rgba::Rgba;

/// D65 reference white in XYZ.
const REF_X: f64 = 0.95047;
const REF_Y: f64 = 1.0;
const REF_Z: f64 = 1.08883;

/// CIE 1976 (L*, a*, b*) color.
///
/// `l` spans `0..=100`; `a` and `b` are unbounded but stay roughly within
/// `-128..=128` for sRGB inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    /// Lightness
    pub l: f64,
    /// Green–red axis
    pub a: f64,
    /// Blue–yellow axis
    pub b: f64,
}

impl Lab {
    /// Convert sRGB channels in `0.0..=255.0` to Lab.
    ///
    /// Channels pass through the inverse sRGB companding curve, then the
    /// linear-RGB→XYZ matrix, then the Lab cube-root transfer.
    pub fn from_srgb(r: f64, g: f64, b: f64) -> Self {
        let r = srgb8_to_linear(r);
        let g = srgb8_to_linear(g);
        let b = srgb8_to_linear(b);

        let x = r * 0.4124 + g * 0.3576 + b * 0.1805;
        let y = r * 0.2126 + g * 0.7152 + b * 0.0722;
        let z = r * 0.0193 + g * 0.1192 + b * 0.9505;

        let fx = pivot(x / REF_X);
        let fy = pivot(y / REF_Y);
        let fz = pivot(z / REF_Z);

        Self {
            l: (116.0 * fy - 16.0).max(0.0),
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    /// Chroma, `sqrt(a² + b²)`.
    #[inline]
    pub fn chroma(&self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }
}

#[inline]
fn pivot(t: f64) -> f64 {
    if t > 0.008856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

impl From<Rgba> for Lab {
    fn from(c: Rgba) -> Self {
        Lab::from_srgb(c.r as f64, c.g as f64, c.b as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_black_and_white() {
        let black = Lab::from(Rgba::opaque(0, 0, 0));
        assert!(close(black.l, 0.0, 1e-9));

        let white = Lab::from(Rgba::opaque(255, 255, 255));
        assert!(close(white.l, 100.0, 0.01));
        assert!(close(white.a, 0.0, 0.05));
        assert!(close(white.b, 0.0, 0.05));
    }

    #[test]
    fn test_primary_red_reference() {
        // Reference values for sRGB red under D65
        let red = Lab::from(Rgba::opaque(255, 0, 0));
        assert!(close(red.l, 53.24, 0.05), "L = {}", red.l);
        assert!(close(red.a, 80.09, 0.1), "a = {}", red.a);
        assert!(close(red.b, 67.20, 0.1), "b = {}", red.b);
    }

    #[test]
    fn test_greys_are_achromatic() {
        for v in [17u8, 64, 128, 200] {
            let lab = Lab::from(Rgba::opaque(v, v, v));
            assert!(lab.chroma() < 0.05, "grey {v} has chroma {}", lab.chroma());
        }
    }
}
