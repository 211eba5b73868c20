//! Cross-engine agreement tests.
//!
//! The lattice and the simulator are checked against the closed form on
//! barrier-free European payoffs, where all three must agree.
//!
//! # Test Categories
//!
//! 1. **Parity**: put-call parity of the closed form
//! 2. **Lattice Convergence**: N = 2000 within 0.1% of Black–Scholes
//! 3. **Monte Carlo Unbiasedness**: independent seeds bracket the closed form
//! 4. **Greeks Consistency**: lattice finite-difference delta vs analytic

use pricer_core::market_data::{MarketSnapshot, UnderlyingQuote};
use pricer_core::types::{Currency, Date};
use pricer_models::instruments::{EquityOption, ExerciseStyle, Instrument, InstrumentTerms, OptionType};
use pricer_pricing::analytical::BlackScholes;
use pricer_pricing::greeks::GreeksCalculator;
use pricer_pricing::lattice::{BinomialTree, LatticeParams, LatticeSpec, NodePayoff};
use pricer_pricing::mc::{MonteCarloConfig, MonteCarloEngine, PathPayoff, PathProduct, SimulationInputs};
use pricer_pricing::pricer::{Pricer, PricingSettings};
use pricer_pricing::selector::ModelType;
use proptest::prelude::*;

/// Standard test parameters: spot, strike, rate, dividend, vol, maturity.
fn standard_params() -> (f64, f64, f64, f64, f64, f64) {
    (100.0, 100.0, 0.05, 0.0, 0.2, 1.0)
}

// ============================================================================
// Put-Call Parity
// ============================================================================

proptest! {
    #[test]
    fn prop_put_call_parity(
        spot in 50.0f64..150.0,
        strike in 50.0f64..150.0,
        rate in -0.02f64..0.10,
        dividend in 0.0f64..0.05,
        vol in 0.05f64..0.8,
        expiry in 0.05f64..3.0,
    ) {
        let bs = BlackScholes::new(spot, rate, dividend, vol).unwrap();
        let lhs = bs.price_call(strike, expiry) - bs.price_put(strike, expiry);
        let rhs = spot * (-dividend * expiry).exp() - strike * (-rate * expiry).exp();
        prop_assert!((lhs - rhs).abs() < 1e-6, "parity gap {}", lhs - rhs);
    }
}

// ============================================================================
// Lattice Convergence
// ============================================================================

#[test]
fn test_lattice_2000_steps_within_tenth_of_percent() {
    let (spot, strike, rate, dividend, vol, expiry) = standard_params();
    let params = LatticeParams {
        spot,
        rate,
        dividend,
        volatility: vol,
        expiry,
    };
    let bs = BlackScholes::new(spot, rate, dividend, vol).unwrap();
    for option_type in [OptionType::Call, OptionType::Put] {
        let payoff = NodePayoff::Vanilla { option_type, strike };
        let lattice = BinomialTree::new(2000)
            .price(&params, &LatticeSpec::new(payoff, 2000))
            .unwrap()
            .value;
        let closed = bs.price(strike, expiry, option_type);
        let rel = ((lattice - closed) / closed).abs();
        assert!(rel < 1e-3, "{:?}: lattice {} closed {} rel {}", option_type, lattice, closed, rel);
    }
}

#[test]
fn test_lattice_error_shrinks_with_depth() {
    let (spot, strike, rate, dividend, vol, expiry) = standard_params();
    let params = LatticeParams {
        spot,
        rate,
        dividend,
        volatility: vol,
        expiry,
    };
    let closed = BlackScholes::new(spot, rate, dividend, vol).unwrap().price_call(strike, expiry);
    let payoff = NodePayoff::Vanilla {
        option_type: OptionType::Call,
        strike,
    };
    let error = |n: usize| {
        let v = BinomialTree::new(n).price(&params, &LatticeSpec::new(payoff, n)).unwrap().value;
        (v - closed).abs()
    };
    assert!(error(1000) < error(50));
}

// ============================================================================
// Monte Carlo Unbiasedness
// ============================================================================

#[test]
fn test_monte_carlo_confidence_interval_covers_closed_form() {
    let (spot, strike, rate, dividend, vol, expiry) = standard_params();
    let closed = BlackScholes::new(spot, rate, dividend, vol).unwrap().price_call(strike, expiry);
    let inputs = SimulationInputs::single(spot, vol, dividend, rate, expiry);
    let product = PathProduct::terminal(PathPayoff::Vanilla {
        option_type: OptionType::Call,
        strike,
    });

    let runs = 50;
    let covered = (0..runs)
        .filter(|&run| {
            let config = MonteCarloConfig::builder()
                .n_paths(20_000)
                .steps_per_year(1)
                .seed(1_000 + run as u64)
                .build()
                .unwrap();
            let result = MonteCarloEngine::new(config).unwrap().run(&inputs, &product).unwrap();
            (result.price - closed).abs() <= result.confidence_95
        })
        .count();
    assert!(
        covered as f64 >= 0.9 * runs as f64,
        "only {} of {} runs covered the closed form",
        covered,
        runs
    );
}

#[test]
fn test_standard_error_decreases_with_paths() {
    let inputs = SimulationInputs::single(100.0, 0.2, 0.0, 0.05, 1.0);
    let product = PathProduct::terminal(PathPayoff::Vanilla {
        option_type: OptionType::Put,
        strike: 100.0,
    });
    let se = |paths: usize| {
        let config = MonteCarloConfig::builder().n_paths(paths).steps_per_year(1).build().unwrap();
        MonteCarloEngine::new(config).unwrap().run(&inputs, &product).unwrap().std_error
    };
    let ratio = se(2_000) / se(32_000);
    assert!(ratio > 3.0 && ratio < 5.0, "ratio {}", ratio);
}

// ============================================================================
// Greeks Consistency
// ============================================================================

#[test]
fn test_lattice_fd_delta_within_one_percent_of_analytic() {
    let as_of = Date::from_ymd(2024, 1, 2).unwrap();
    let terms = InstrumentTerms::new("OPT", Currency::USD, as_of, Date::from_ymd(2025, 1, 1).unwrap(), 1.0);
    let option: Instrument = EquityOption::new(terms, "ACME", 100.0, OptionType::Call, ExerciseStyle::European)
        .unwrap()
        .into();
    let snapshot = MarketSnapshot::new(as_of, 0.05).with_quote(UnderlyingQuote::new("ACME", 100.0, 0.2));

    let analytic = GreeksCalculator::new(Pricer::default())
        .calculate(&option, &snapshot, None)
        .unwrap();
    let pricer = Pricer::new(PricingSettings {
        lattice_steps: 1000,
        ..PricingSettings::default()
    })
    .unwrap();
    let lattice = GreeksCalculator::new(pricer)
        .calculate(&option, &snapshot, Some(ModelType::Binomial))
        .unwrap();

    let rel = ((lattice.delta - analytic.delta) / analytic.delta).abs();
    assert!(rel < 0.01, "lattice {} analytic {}", lattice.delta, analytic.delta);
}
