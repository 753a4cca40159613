//! Numeric helpers shared by the model and the engine.
//!
//! The engine never divides by a raw denominator and never consumes a
//! ratio dial without clamping it first; these helpers are the single
//! place both rules live.

/// Floor applied to every denominator before dividing.
pub const EPSILON: f64 = 1e-6;

/// Divide with an epsilon-floored denominator.
///
/// Utilization and acceptance ratios use this so a zero capacity
/// produces a huge-but-finite number instead of infinity or NaN.
#[must_use]
pub fn floor_div(numerator: f64, denominator: f64) -> f64 {
    numerator / denominator.max(EPSILON)
}

/// Clamp a ratio or probability dial into `[0, 1]`.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_floor_div_zero_denominator() {
        let v = floor_div(1.0, 0.0);
        assert!(v.is_finite());
        assert_eq!(v, 1.0 / EPSILON);
    }

    #[test]
    fn test_floor_div_normal() {
        assert_eq!(floor_div(10.0, 2.0), 5.0);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(0.3), 0.3);
        assert_eq!(clamp_unit(1.7), 1.0);
    }

    proptest! {
        #[test]
        fn prop_floor_div_finite(n in -1e9f64..1e9, d in 0.0f64..1e9) {
            prop_assert!(floor_div(n, d).is_finite());
        }

        #[test]
        fn prop_clamp_unit_in_range(v in -1e6f64..1e6) {
            let c = clamp_unit(v);
            prop_assert!((0.0..=1.0).contains(&c));
        }
    }
}
