//! Standard normal distribution functions.
//!
//! `norm_cdf` is built on the Abramowitz and Stegun complementary error
//! function approximation (formula 7.1.26, maximum absolute error 1.5e-7).
//! The approximation is exactly symmetric, so `norm_cdf(x) + norm_cdf(-x)`
//! equals one up to rounding, which keeps put-call parity tight.

use std::f64::consts::SQRT_2;

/// 1 / sqrt(2 * pi)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Complementary error function, A&S 7.1.26.
#[inline]
pub fn erfc_approx(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let abs_x = x.abs();
    let t = 1.0 / (1.0 + P * abs_x);
    let poly = A1 + t * (A2 + t * (A3 + t * (A4 + t * A5)));
    let erfc_abs = t * poly * (-abs_x * abs_x).exp();

    if x < 0.0 {
        2.0 - erfc_abs
    } else {
        erfc_abs
    }
}

/// Error function, `1 - erfc(x)`.
#[inline]
pub fn erf_approx(x: f64) -> f64 {
    1.0 - erfc_approx(x)
}

/// Standard normal cumulative distribution function.
///
/// Φ(x) = ½ · erfc(−x/√2)
///
/// # Examples
/// ```
/// use pricer_core::math::distributions::norm_cdf;
///
/// assert!((norm_cdf(0.0) - 0.5).abs() < 1e-7);
/// assert!((norm_cdf(1.96) - 0.975).abs() < 1e-4);
/// ```
#[inline]
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc_approx(-x / SQRT_2)
}

/// Standard normal probability density function.
///
/// ```
/// use pricer_core::math::distributions::norm_pdf;
///
/// assert!((norm_pdf(0.0) - 0.398_942_280_4).abs() < 1e-9);
/// ```
#[inline]
pub fn norm_pdf(x: f64) -> f64 {
    FRAC_1_SQRT_2PI * (-0.5 * x * x).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_norm_cdf_reference_values() {
        // Reference values from standard normal tables
        let cases = [
            (-3.0, 0.001_349_898),
            (-1.0, 0.158_655_254),
            (0.0, 0.5),
            (0.5, 0.691_462_461),
            (1.0, 0.841_344_746),
            (2.0, 0.977_249_868),
        ];
        for (x, expected) in cases {
            assert!(
                (norm_cdf(x) - expected).abs() < 2e-7,
                "norm_cdf({}) = {}, expected {}",
                x,
                norm_cdf(x),
                expected
            );
        }
    }

    #[test]
    fn test_norm_pdf_reference_values() {
        assert_relative_eq!(norm_pdf(1.0), 0.241_970_724_5, epsilon = 1e-9);
        assert_relative_eq!(norm_pdf(-1.0), norm_pdf(1.0), epsilon = 1e-15);
    }

    #[test]
    fn test_erf_tails() {
        assert!(erf_approx(6.0) > 0.999_999);
        assert!(erf_approx(-6.0) < -0.999_999);
        assert_relative_eq!(erf_approx(0.0), 0.0, epsilon = 1e-8);
    }

    proptest! {
        #[test]
        fn prop_cdf_symmetry(x in -8.0f64..8.0) {
            prop_assert!((norm_cdf(x) + norm_cdf(-x) - 1.0).abs() < 1e-14);
        }

        #[test]
        fn prop_cdf_monotone_and_bounded(x in -8.0f64..8.0, dx in 0.0f64..1.0) {
            let a = norm_cdf(x);
            let b = norm_cdf(x + dx);
            prop_assert!((0.0..=1.0).contains(&a));
            prop_assert!(b >= a - 1e-7);
        }
    }
}
