//! Clamping and guarded division used by every system.
//!
//! Neither helper panics: `clamp` tolerates inverted bounds and `safe_div`
//! never lets a non-finite quotient escape.

/// Clamps `value` into `[min, max]`.
///
/// Unlike [`f64::clamp`] this never panics. With `min > max`, a value below
/// `min` returns `min` and any other value returns `max`.
#[inline]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Divides `numerator` by `denominator`, returning `default` on a zero
/// denominator or a non-finite result.
#[inline]
pub fn safe_div(numerator: f64, denominator: f64, default: f64) -> f64 {
    if denominator == 0.0 {
        return default;
    }
    let quotient = numerator / denominator;
    if quotient.is_finite() {
        quotient
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(clamp(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(2.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
    }

    #[test]
    fn test_clamp_inverted_bounds() {
        // below min: min wins
        assert_eq!(clamp(0.0, 3.0, 1.0), 3.0);
        // otherwise the upper bound wins
        assert_eq!(clamp(5.0, 3.0, 1.0), 1.0);
        assert_eq!(clamp(3.0, 3.0, 1.0), 1.0);
    }

    #[test]
    fn test_safe_div_zero_denominator() {
        assert_eq!(safe_div(10.0, 0.0, 1.0), 1.0);
        assert_eq!(safe_div(10.0, 4.0, 1.0), 2.5);
    }

    #[test]
    fn test_safe_div_non_finite() {
        assert_eq!(safe_div(f64::MAX, 1e-300, 7.0), 7.0);
        assert_eq!(safe_div(f64::NAN, 2.0, 0.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_clamp_stays_in_range(v in -1e6f64..1e6, lo in -100.0f64..0.0, hi in 0.0f64..100.0) {
            let c = clamp(v, lo, hi);
            prop_assert!(c >= lo && c <= hi);
        }

        #[test]
        fn prop_safe_div_is_finite(n in -1e6f64..1e6, d in -1e3f64..1e3) {
            prop_assert!(safe_div(n, d, 0.0).is_finite());
        }
    }
}
