/// Prominence of a maximum and the bases it is measured against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prominence {
    pub value: f64,
    pub left_base: usize,
    pub right_base: usize,
}

/// How far the maximum at `peak` stands out from the surrounding trace.
///
/// Walks outwards on both sides until a higher sample (or the edge) is hit,
/// tracking the lowest sample on the way. The prominence is measured against
/// the higher of the two minima.
pub fn prominence(x: &[f64], peak: usize) -> Prominence {
    let top = x[peak];

    let mut left_min = top;
    let mut left_base = peak;
    for i in (0..=peak).rev() {
        if x[i] > top {
            break;
        }
        if x[i] < left_min {
            left_min = x[i];
            left_base = i;
        }
    }

    let mut right_min = top;
    let mut right_base = peak;
    for (i, v) in x.iter().enumerate().skip(peak) {
        if *v > top {
            break;
        }
        if *v < right_min {
            right_min = *v;
            right_base = i;
        }
    }

    Prominence {
        value: top - left_min.max(right_min),
        left_base,
        right_base,
    }
}

/// Width of a maximum at a fraction of its prominence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakWidth {
    pub prominence: f64,
    /// Width in samples.
    pub width: f64,
    /// Interpolated sample positions of the left and right crossings.
    pub left: f64,
    pub right: f64,
}

/// Finds where the trace drops to `rel_height` of the prominence below the
/// apex on each side, interpolating linearly between samples.
///
/// The walk never goes past the prominence bases.
pub fn peak_width(x: &[f64], peak: usize, rel_height: f64) -> PeakWidth {
    let prom = prominence(x, peak);
    let height = x[peak] - prom.value * rel_height;

    let mut i = peak;
    while prom.left_base < i && height < x[i] {
        i -= 1;
    }
    let mut left = i as f64;
    if x[i] < height {
        left += (height - x[i]) / (x[i + 1] - x[i]);
    }

    let mut i = peak;
    while i < prom.right_base && height < x[i] {
        i += 1;
    }
    let mut right = i as f64;
    if x[i] < height {
        right -= (height - x[i]) / (x[i - 1] - x[i]);
    }

    PeakWidth {
        prominence: prom.value,
        width: right - left,
        left,
        right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prominence_uses_higher_base() {
        let x = [0.0, 1.0, 4.0, 2.0, 3.0, 1.0, 5.0];
        let prom = prominence(&x, 2);
        // Left minimum 0, right walk stops at 5 with minimum 1.
        assert_eq!(prom.value, 3.0);
        assert_eq!(prom.left_base, 0);
        assert_eq!(prom.right_base, 5);
    }

    #[test]
    fn test_triangle_width_at_half_prominence() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0, 0.0];
        let w = peak_width(&x, 4, 0.5);
        assert_eq!(w.prominence, 4.0);
        assert!((w.left - 2.0).abs() < 1e-12);
        assert!((w.right - 6.0).abs() < 1e-12);
        assert!((w.width - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_width_interpolates_between_samples() {
        let x = [0.0, 4.0, 8.0, 4.0, 0.0];
        let w = peak_width(&x, 2, 0.75);
        // Crossing at height 2, halfway between samples 0 and 1.
        assert!((w.left - 0.5).abs() < 1e-12);
        assert!((w.right - 3.5).abs() < 1e-12);
    }
}
