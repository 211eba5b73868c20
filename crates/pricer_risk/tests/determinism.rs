//! Results must not depend on the worker pool size.

use pricer_core::market_data::{MarketSnapshot, UnderlyingQuote};
use pricer_core::types::{Currency, Date};
use pricer_models::instruments::{
    BarrierFeature, BarrierType, Instrument, InstrumentTerms, PayoffParams, StructuredProduct, UnderlyingAsset,
};
use pricer_risk::config::EngineConfig;
use pricer_risk::orchestrator::{ValuationEngine, ValuationOptions};
use pricer_risk::scenario::ScenarioGrid;

fn basket_note() -> Instrument {
    let as_of = Date::from_ymd(2024, 1, 2).unwrap();
    let terms = InstrumentTerms::new("BASKET", Currency::USD, as_of, Date::from_ymd(2025, 1, 2).unwrap(), 1_000.0);
    StructuredProduct::new(
        terms,
        vec![
            UnderlyingAsset::new("AAA", 50.0, 100.0),
            UnderlyingAsset::new("BBB", 50.0, 50.0),
        ],
        vec![BarrierFeature::new("KI", BarrierType::DownAndIn, "AAA", 0.6)],
        PayoffParams::basket(1.0).unwrap(),
    )
    .unwrap()
    .into()
}

fn snapshot() -> MarketSnapshot {
    MarketSnapshot::new(Date::from_ymd(2024, 1, 2).unwrap(), 0.03)
        .with_quote(UnderlyingQuote::new("AAA", 100.0, 0.25))
        .with_quote(UnderlyingQuote::new("BBB", 50.0, 0.3))
        .with_correlation("AAA", "BBB", 0.5)
}

fn engine(threads: usize) -> ValuationEngine {
    let mut config = EngineConfig::default();
    config.monte_carlo.paths = 3_000;
    config.monte_carlo.chunk_size = 256;
    config.parallel.worker_threads = threads;
    ValuationEngine::new(config).unwrap()
}

#[test]
fn test_monte_carlo_and_scenarios_independent_of_threads() {
    let options = ValuationOptions::default().with_scenarios(ScenarioGrid::new(vec![-0.1, 0.0, 0.1], vec![0.0]).unwrap());
    let single = engine(1).valuate(&basket_note(), &snapshot(), &options).unwrap();
    let many = engine(4).valuate(&basket_note(), &snapshot(), &options).unwrap();

    assert_eq!(single.value, many.value);
    assert_eq!(single.diagnostics.std_error, many.diagnostics.std_error);
    let a = single.scenarios.unwrap();
    let b = many.scenarios.unwrap();
    for (x, y) in a.results.iter().zip(&b.results) {
        assert_eq!(x.pnl.stressed_value, y.pnl.stressed_value);
    }
}

#[test]
fn test_scenario_values_move_with_spot() {
    let options = ValuationOptions::default().with_scenarios(ScenarioGrid::new(vec![-0.2, 0.2], vec![0.0]).unwrap());
    let result = engine(2).valuate(&basket_note(), &snapshot(), &options).unwrap();
    let rows = result.scenarios.unwrap().results;
    // common random numbers keep the ordering clean
    assert!(rows[0].pnl.is_loss());
    assert!(rows[1].pnl.is_gain());
}
