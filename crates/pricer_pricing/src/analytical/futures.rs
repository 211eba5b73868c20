//! Futures valuation under cost-of-carry.
//!
//! Value of a long position per unit: `S·e^(−qT) − K·e^(−rT)`, where `K`
//! is the traded contract price. Volatility does not enter.

use super::black_scholes::{AnalyticGreeks, EXPIRY_EPSILON};

/// Value and Greeks of a long futures position per unit.
///
/// ```
/// use pricer_pricing::analytical::future_greeks;
///
/// let g = future_greeks(100.0, 95.0, 0.05, 0.0, 1.0);
/// assert!((g.price - (100.0 - 95.0 * (-0.05f64).exp())).abs() < 1e-12);
/// assert_eq!(g.vega, 0.0);
/// ```
pub fn future_greeks(spot: f64, contract: f64, rate: f64, dividend: f64, expiry: f64) -> AnalyticGreeks {
    if expiry <= EXPIRY_EPSILON {
        return AnalyticGreeks {
            price: spot - contract,
            delta: 1.0,
            ..AnalyticGreeks::default()
        };
    }
    let dq = (-dividend * expiry).exp();
    let df = (-rate * expiry).exp();
    AnalyticGreeks {
        price: spot * dq - contract * df,
        delta: dq,
        theta: dividend * spot * dq - rate * contract * df,
        rho: contract * expiry * df,
        charm: dividend * dq,
        ..AnalyticGreeks::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_theta_matches_time_decay() {
        let t = 0.5;
        let g = future_greeks(100.0, 101.0, 0.04, 0.01, t);
        let later = future_greeks(100.0, 101.0, 0.04, 0.01, t - 1e-6);
        assert_relative_eq!(g.theta, (later.price - g.price) / 1e-6, epsilon = 1e-4);
    }

    #[test]
    fn test_expired_is_linear() {
        let g = future_greeks(105.0, 100.0, 0.05, 0.0, 0.0);
        assert_eq!(g.price, 5.0);
        assert_eq!(g.delta, 1.0);
    }
}
