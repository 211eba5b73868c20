//! Integration tests for module exports.
//!
//! Verifies that the public modules and types are reachable via absolute
//! paths from outside the crate.

use approx::assert_relative_eq;

/// Distribution helpers are accessible via absolute path.
#[test]
fn test_distributions_module_exports() {
    use pricer_core::math::distributions::{norm_cdf, norm_pdf};

    assert_relative_eq!(norm_cdf(0.0), 0.5, epsilon = 1e-7);
    assert_relative_eq!(norm_pdf(0.0), 0.398_942_280_4, epsilon = 1e-9);
    assert_relative_eq!(norm_cdf(1.96), 0.975, epsilon = 1e-4);
}

/// Solver types are accessible and solve a simple root.
#[test]
fn test_solvers_module_exports() {
    use pricer_core::math::solvers::{NewtonRaphsonSolver, SolverConfig};

    let solver = NewtonRaphsonSolver::new(SolverConfig::new(1e-12, 50).with_bounds(0.0, 10.0));
    let root = solver
        .find_root(|x| x * x * x - 8.0, |x| 3.0 * x * x, 1.0)
        .unwrap();
    assert_relative_eq!(root, 2.0, epsilon = 1e-9);
}

/// Solver errors convert into the crate-wide pricing error.
#[test]
fn test_solver_error_converts_to_pricing_error() {
    use pricer_core::math::solvers::{NewtonRaphsonSolver, SolverConfig};
    use pricer_core::types::PricingError;

    let solver = NewtonRaphsonSolver::new(SolverConfig::new(1e-14, 3));
    let err: PricingError = solver
        .find_root(|x| x * x + 1.0, |x| 2.0 * x, 3.0)
        .unwrap_err()
        .into();
    assert!(!err.is_input_error());
}

/// Correlation factorisation is accessible via absolute path.
#[test]
fn test_correlation_module_exports() {
    use pricer_core::math::correlation::CorrelationMatrix;

    let matrix = CorrelationMatrix::new(&[1.0, 0.5, 0.5, 1.0], 2).unwrap();
    let factor = matrix.cholesky().unwrap();
    let correlated = factor.transform(&[1.0, 0.0]);
    assert_relative_eq!(correlated[0], 1.0, epsilon = 1e-12);
    assert_relative_eq!(correlated[1], 0.5, epsilon = 1e-12);
}

/// Market data types are accessible and compose into a snapshot.
#[test]
fn test_market_data_module_exports() {
    use pricer_core::market_data::{MarketSnapshot, UnderlyingQuote};
    use pricer_core::types::Date;

    let as_of = Date::from_ymd(2024, 6, 3).unwrap();
    let snapshot = MarketSnapshot::new(as_of, 0.03)
        .with_quote(UnderlyingQuote::new("AAA", 100.0, 0.2))
        .with_quote(UnderlyingQuote::new("BBB", 50.0, 0.3))
        .with_correlation("AAA", "BBB", 0.4);

    assert_relative_eq!(snapshot.correlation("BBB", "AAA"), 0.4);
    assert_relative_eq!(snapshot.correlation("AAA", "AAA"), 1.0);

    let shocked = snapshot.with_spot_shift(-0.1).with_vol_shift(0.05);
    assert_relative_eq!(shocked.quote("AAA").unwrap().spot, 90.0, epsilon = 1e-12);
    assert_relative_eq!(shocked.quote("BBB").unwrap().volatility, 0.35, epsilon = 1e-12);
    assert!(snapshot.quote("CCC").is_err());
}

/// Time and currency types are accessible via the `types` re-exports.
#[test]
fn test_types_module_exports() {
    use pricer_core::types::{time_to_maturity_dates, Currency, Date};

    let start = Date::parse("2024-01-01").unwrap();
    let end = start.add_days(365);
    assert_relative_eq!(time_to_maturity_dates(start, end), 1.0, epsilon = 1e-12);
    assert_eq!(end - start, 365);
    assert_eq!(Currency::EUR.code(), "EUR");
}
