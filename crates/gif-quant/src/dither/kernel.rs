//! Error diffusion kernel definitions.
//!
//! Each kernel lists the neighbours that receive a share of a pixel's
//! quantization error as `(dx, dy, weight)`; a neighbour receives
//! `error * weight / divisor`. Offsets are given for left-to-right rows and
//! mirrored horizontally on right-to-left rows.

/// An error diffusion kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel {
    /// `(dx, dy, weight)` entries; `dy` is never negative
    pub entries: &'static [(i32, i32, u8)],
    /// Normalizing divisor for the weights
    pub divisor: u8,
    /// Largest `dy`; the error buffer keeps `max_dy + 1` rows
    pub max_dy: usize,
}

impl Kernel {
    /// Sum of weights over the divisor. Below 1.0 means some error is dropped.
    pub fn propagation(&self) -> f64 {
        let total: u32 = self.entries.iter().map(|e| e.2 as u32).sum();
        total as f64 / self.divisor as f64
    }
}

/// Floyd–Steinberg.
///
/// ```text
///        X   7
///    3   5   1     (/16)
/// ```
pub const FLOYD_STEINBERG: Kernel = Kernel {
    entries: &[(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)],
    divisor: 16,
    max_dy: 1,
};

/// "False" Floyd–Steinberg, a three-neighbour approximation.
///
/// ```text
///    X   3
///    3   2         (/8)
/// ```
pub const FALSE_FLOYD_STEINBERG: Kernel = Kernel {
    entries: &[(1, 0, 3), (0, 1, 3), (1, 1, 2)],
    divisor: 8,
    max_dy: 1,
};

/// Stucki.
///
/// ```text
///            X   8   4
///    2   4   8   4   2
///    1   2   4   2   1     (/42)
/// ```
pub const STUCKI: Kernel = Kernel {
    entries: &[
        (1, 0, 8),
        (2, 0, 4),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 8),
        (1, 1, 4),
        (2, 1, 2),
        (-2, 2, 1),
        (-1, 2, 2),
        (0, 2, 4),
        (1, 2, 2),
        (2, 2, 1),
    ],
    divisor: 42,
    max_dy: 2,
};

/// Atkinson; propagates only 6/8 of the error.
///
/// ```text
///        X   1   1
///    1   1   1
///        1             (/8)
/// ```
pub const ATKINSON: Kernel = Kernel {
    entries: &[
        (1, 0, 1),
        (2, 0, 1),
        (-1, 1, 1),
        (0, 1, 1),
        (1, 1, 1),
        (0, 2, 1),
    ],
    divisor: 8,
    max_dy: 2,
};

/// Jarvis–Judice–Ninke.
///
/// ```text
///            X   7   5
///    3   5   7   5   3
///    1   3   5   3   1     (/48)
/// ```
pub const JARVIS: Kernel = Kernel {
    entries: &[
        (1, 0, 7),
        (2, 0, 5),
        (-2, 1, 3),
        (-1, 1, 5),
        (0, 1, 7),
        (1, 1, 5),
        (2, 1, 3),
        (-2, 2, 1),
        (-1, 2, 3),
        (0, 2, 5),
        (1, 2, 3),
        (2, 2, 1),
    ],
    divisor: 48,
    max_dy: 2,
};

/// Burkes.
///
/// ```text
///            X   8   4
///    2   4   8   4   2     (/32)
/// ```
pub const BURKES: Kernel = Kernel {
    entries: &[
        (1, 0, 8),
        (2, 0, 4),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 8),
        (1, 1, 4),
        (2, 1, 2),
    ],
    divisor: 32,
    max_dy: 1,
};

/// Sierra (three rows).
///
/// ```text
///            X   5   3
///    2   4   5   4   2
///        2   3   2         (/32)
/// ```
pub const SIERRA: Kernel = Kernel {
    entries: &[
        (1, 0, 5),
        (2, 0, 3),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 5),
        (1, 1, 4),
        (2, 1, 2),
        (-1, 2, 2),
        (0, 2, 3),
        (1, 2, 2),
    ],
    divisor: 32,
    max_dy: 2,
};

/// Two-row Sierra.
///
/// ```text
///            X   4   3
///    1   2   3   2   1     (/16)
/// ```
pub const TWO_SIERRA: Kernel = Kernel {
    entries: &[
        (1, 0, 4),
        (2, 0, 3),
        (-2, 1, 1),
        (-1, 1, 2),
        (0, 1, 3),
        (1, 1, 2),
        (2, 1, 1),
    ],
    divisor: 16,
    max_dy: 1,
};

/// Sierra Lite.
///
/// ```text
///        X   2
///    1   1         (/4)
/// ```
pub const SIERRA_LITE: Kernel = Kernel {
    entries: &[(1, 0, 2), (-1, 1, 1), (0, 1, 1)],
    divisor: 4,
    max_dy: 1,
};

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [(&str, Kernel); 9] = [
        ("floyd-steinberg", FLOYD_STEINBERG),
        ("false-floyd-steinberg", FALSE_FLOYD_STEINBERG),
        ("stucki", STUCKI),
        ("atkinson", ATKINSON),
        ("jarvis", JARVIS),
        ("burkes", BURKES),
        ("sierra", SIERRA),
        ("two-sierra", TWO_SIERRA),
        ("sierra-lite", SIERRA_LITE),
    ];

    #[test]
    fn test_weights_sum_to_divisor() {
        for (name, kernel) in ALL {
            let expected = if name == "atkinson" { 0.75 } else { 1.0 };
            assert!(
                (kernel.propagation() - expected).abs() < 1e-12,
                "{name}: {}",
                kernel.propagation()
            );
        }
    }

    #[test]
    fn test_max_dy_matches_entries() {
        for (name, kernel) in ALL {
            let max = kernel.entries.iter().map(|e| e.1).max().unwrap();
            assert_eq!(kernel.max_dy, max as usize, "{name}");
        }
    }

    #[test]
    fn test_entries_only_reach_unprocessed_pixels() {
        for (name, kernel) in ALL {
            for &(dx, dy, _) in kernel.entries {
                assert!(dy > 0 || dx > 0, "{name} reaches back to ({dx}, {dy})");
            }
        }
    }
}
