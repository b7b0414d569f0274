//! The single rounding rule shared by the sampler and the estimator.
//!
//! Precision `p >= 1` rounds half away from zero at `10^-p`; precision `0`
//! floors to whole volts. Before the final step the scaled value is snapped to
//! 1/10000 of a step so that binary noise (`3.85f32` is `3.8499999...`) cannot
//! push an exact decimal half to the wrong side.

/// Largest precision the monitor accepts. `f32` carries about seven
/// significant digits, so finer steps would round noise.
pub const MAX_PRECISION: u8 = 6;

const SNAP: f64 = 1e4;

pub(crate) fn snap(x: f64) -> f64 {
    (x * SNAP).round() / SNAP
}

/// Round `value` to `precision` decimal places.
pub fn round_to_precision(value: f32, precision: u8) -> f32 {
    if !value.is_finite() {
        return value;
    }
    let value = value as f64;
    if precision == 0 {
        return snap(value).floor() as f32;
    }
    let factor = 10f64.powi(precision.min(MAX_PRECISION) as i32);
    (snap(value * factor).round() / factor) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_one_decimal() {
        assert_eq!(round_to_precision(4.534, 1), 4.5);
        assert_eq!(round_to_precision(4.55, 1), 4.6);
        assert_eq!(round_to_precision(3.85, 1), 3.9);
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_to_precision(0.25, 1), 0.3);
        assert_eq!(round_to_precision(-0.25, 1), -0.3);
    }

    #[test]
    fn test_round_two_decimals() {
        assert_eq!(round_to_precision(3.14159, 2), 3.14);
        assert_eq!(round_to_precision(4.005, 2), 4.01);
    }

    #[test]
    fn test_precision_zero_floors() {
        assert_eq!(round_to_precision(4.99, 0), 4.0);
        assert_eq!(round_to_precision(3.0, 0), 3.0);
    }

    #[test]
    fn test_precision_is_capped() {
        let v = 1.234_567_9_f32;
        assert_eq!(round_to_precision(v, 40), round_to_precision(v, MAX_PRECISION));
    }

    #[test]
    fn test_rounding_is_idempotent() {
        for precision in 0..=4u8 {
            let mut v = 2.9f32;
            while v < 5.0 {
                let once = round_to_precision(v, precision);
                let twice = round_to_precision(once, precision);
                assert_eq!(once, twice, "value {} precision {}", v, precision);
                v += 0.0137;
            }
        }
    }

    #[test]
    fn test_non_finite_passes_through() {
        assert!(round_to_precision(f32::NAN, 1).is_nan());
        assert_eq!(round_to_precision(f32::INFINITY, 1), f32::INFINITY);
    }
}
