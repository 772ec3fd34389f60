//! Gamma lookup table generated at compile time by build.rs.

include!(concat!(env!("OUT_DIR"), "/gamma_lut.rs"));

/// Convert an sRGB channel in `0.0..=255.0` to linear light.
///
/// Integral inputs hit the table directly; fractional inputs (from a rescaled
/// white point) interpolate between neighbouring entries.
#[inline]
pub fn srgb8_to_linear(value: f64) -> f64 {
    let value = value.clamp(0.0, 255.0);
    let index = value as usize;
    if index >= 255 {
        return SRGB8_TO_LINEAR[255];
    }

    let frac = value - index as f64;
    let a = SRGB8_TO_LINEAR[index];
    if frac == 0.0 {
        return a;
    }
    let b = SRGB8_TO_LINEAR[index + 1];
    a + (b - a) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(srgb8_to_linear(0.0), 0.0);
        assert!((srgb8_to_linear(255.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_segment() {
        // Below the 0.04045 knee the transform is a plain division
        let expected = (10.0 / 255.0) / 12.92;
        assert!((srgb8_to_linear(10.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_monotonic() {
        for i in 0..255 {
            assert!(SRGB8_TO_LINEAR[i] < SRGB8_TO_LINEAR[i + 1]);
        }
    }

    #[test]
    fn test_out_of_range_clamps() {
        assert_eq!(srgb8_to_linear(-4.0), 0.0);
        assert_eq!(srgb8_to_linear(300.0), SRGB8_TO_LINEAR[255]);
    }
}
