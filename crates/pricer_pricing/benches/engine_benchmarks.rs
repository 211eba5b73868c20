//! Criterion benchmarks for the pricing engines.
//!
//! Covers closed-form pricing and Greeks, lattice depth scaling, Monte Carlo
//! path-count scaling and implied volatility inversion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pricer_models::instruments::{BarrierType, OptionType, PayoffParams};
use pricer_pricing::analytical::BlackScholes;
use pricer_pricing::implied_vol::{ImpliedVolInputs, ImpliedVolSolver};
use pricer_pricing::lattice::{BinomialTree, LatticeParams, LatticeSpec, NodePayoff};
use pricer_pricing::mc::{
    MonteCarloConfig, MonteCarloEngine, PathBarrier, PathObservation, PathPayoff, PathProduct,
    SimulationInputs,
};

fn lattice_params() -> LatticeParams {
    LatticeParams {
        spot: 100.0,
        rate: 0.05,
        dividend: 0.0,
        volatility: 0.2,
        expiry: 1.0,
    }
}

/// Benchmark Black-Scholes price and full Greeks.
fn bench_closed_form(c: &mut Criterion) {
    let bs = BlackScholes::new(100.0, 0.05, 0.0, 0.2).unwrap();
    c.bench_function("black_scholes_price", |b| {
        b.iter(|| bs.price(black_box(100.0), black_box(1.0), OptionType::Call))
    });
    c.bench_function("black_scholes_greeks", |b| {
        b.iter(|| bs.greeks(black_box(100.0), black_box(1.0), OptionType::Call))
    });
}

/// Benchmark American put pricing across lattice depths.
fn bench_lattice(c: &mut Criterion) {
    let mut group = c.benchmark_group("binomial_american_put");
    let payoff = NodePayoff::Vanilla {
        option_type: OptionType::Put,
        strike: 100.0,
    };
    for steps in [100, 500, 2000] {
        let tree = BinomialTree::new(steps);
        let spec = LatticeSpec::new(payoff, steps).american();
        group.bench_with_input(BenchmarkId::from_parameter(steps), &spec, |b, spec| {
            b.iter(|| tree.price(black_box(&lattice_params()), spec).unwrap())
        });
    }
    group.finish();
}

/// Benchmark a knock-out note across path counts.
fn bench_monte_carlo(c: &mut Criterion) {
    let mut group = c.benchmark_group("monte_carlo_knock_out_note");
    group.sample_size(10);
    let product = PathProduct::terminal(PathPayoff::Note {
        payoff: PayoffParams::Participation { rate: 1.0 },
        weights: vec![1.0],
        initial_levels: vec![100.0],
    })
    .with_barrier(PathBarrier {
        asset: 0,
        barrier_type: BarrierType::DownAndOut,
        level: 70.0,
        observation: PathObservation::Continuous,
        rebate: 0.0,
        coupon: 0.0,
        already_hit: false,
    });
    let inputs = SimulationInputs::single(100.0, 0.2, 0.0, 0.05, 1.0);
    for paths in [1_000, 10_000, 50_000] {
        let config = MonteCarloConfig::builder()
            .n_paths(paths)
            .steps_per_year(52)
            .build()
            .unwrap();
        let engine = MonteCarloEngine::new(config).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(paths), &engine, |b, engine| {
            b.iter(|| engine.run(black_box(&inputs), &product).unwrap())
        });
    }
    group.finish();
}

/// Benchmark implied volatility inversion.
fn bench_implied_vol(c: &mut Criterion) {
    let solver = ImpliedVolSolver::with_defaults();
    let inputs = ImpliedVolInputs {
        option_price: 10.4506,
        spot: 100.0,
        strike: 100.0,
        expiry: 1.0,
        rate: 0.05,
        dividend: 0.0,
        option_type: OptionType::Call,
    };
    c.bench_function("implied_vol_atm_call", |b| {
        b.iter(|| solver.solve(black_box(&inputs)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_closed_form,
    bench_lattice,
    bench_monte_carlo,
    bench_implied_vol
);
criterion_main!(benches);
