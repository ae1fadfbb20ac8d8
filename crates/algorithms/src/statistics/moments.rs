//! Skewness and kurtosis of a histogram window
//!
//! Moments are taken over the count-weighted bin distribution: bin `i` of the
//! window contributes `counts[i]` observations at position `i`. Skewness and
//! kurtosis are invariant under the affine map from bin position to value, so
//! positions are used directly.

/// Standardized third and fourth moments (population, Fisher definition)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// `m3 / m2^1.5`
    pub skewness: f64,
    /// Excess kurtosis, `m4 / m2^2 - 3`
    pub kurtosis: f64,
}

/// Skewness and kurtosis of a contiguous slice of bin counts.
///
/// Returns `None` when the moments are undefined: fewer than two
/// observations in the window, or every observation in a single bin
/// (zero variance). Such windows are excluded from the threshold search.
pub fn window_moments(counts: &[u64]) -> Option<Moments> {
    let total: u64 = counts.iter().sum();
    if total < 2 {
        return None;
    }
    let n = total as f64;

    let mean = counts
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum::<f64>()
        / n;

    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for (i, &c) in counts.iter().enumerate() {
        if c == 0 {
            continue;
        }
        let d = i as f64 - mean;
        let d2 = d * d;
        let w = c as f64;
        m2 += w * d2;
        m3 += w * d2 * d;
        m4 += w * d2 * d2;
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;

    if m2 <= f64::EPSILON {
        return None;
    }

    Some(Moments {
        skewness: m3 / m2.powf(1.5),
        kurtosis: m4 / (m2 * m2) - 3.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_symmetric_window() {
        let m = window_moments(&[1, 4, 6, 4, 1]).unwrap();
        assert_abs_diff_eq!(m.skewness, 0.0, epsilon = 1e-12);
        // Binomial(4, 0.5): excess kurtosis = -2/n = -0.5
        assert_abs_diff_eq!(m.kurtosis, -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_two_point_distribution() {
        // Equal mass at two points: skewness 0, kurtosis 1 - 3 = -2
        let m = window_moments(&[5, 0, 0, 5]).unwrap();
        assert_abs_diff_eq!(m.skewness, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.kurtosis, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_right_tail_positive_skew() {
        let m = window_moments(&[10, 6, 3, 1, 0, 1]).unwrap();
        assert!(m.skewness > 0.0);

        let mirrored = window_moments(&[1, 0, 1, 3, 6, 10]).unwrap();
        assert_abs_diff_eq!(mirrored.skewness, -m.skewness, epsilon = 1e-12);
        assert_abs_diff_eq!(mirrored.kurtosis, m.kurtosis, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_windows() {
        assert!(window_moments(&[]).is_none());
        assert!(window_moments(&[0, 0, 0]).is_none());
        assert!(window_moments(&[1]).is_none());
        assert!(window_moments(&[0, 7, 0]).is_none());
    }
}
