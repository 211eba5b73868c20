//! Valuation orchestrator.
//!
//! [`ValuationEngine`] is the single entry point for valuing an
//! instrument: it selects a model, prices, and optionally adds Greeks,
//! barrier statuses and scenario P&L, all on its own bounded worker pool.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use pricer_core::market_data::{MarketSnapshot, UnderlyingQuote};
use pricer_core::types::PricingError;
use pricer_models::instruments::Instrument;
use pricer_pricing::greeks::{GreeksCalculator, GreeksResult};
use pricer_pricing::implied_vol::{ImpliedVolInputs, ImpliedVolSolver, ImpliedVolatilityAnalysis};
use pricer_pricing::pricer::{ModelDiagnostics, PriceOutcome, Pricer};
use pricer_pricing::selector::{select_model, ModelType};
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, warn};

use crate::barrier::{BarrierEvaluator, BarrierKey, BarrierStateStore, BarrierStatus};
use crate::config::EngineConfig;
use crate::margin::{MarginCalculationResult, MarginCalculator, MarginPosition};
use crate::scenario::{MarketShock, PresetScenarioType, ScenarioAnalysis, ScenarioEngine, ScenarioGrid};

/// What to compute besides the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationOptions {
    /// Model override; the selector decides when absent.
    pub model: Option<ModelType>,
    /// Compute Greeks.
    pub include_greeks: bool,
    /// Evaluate barriers and record hits.
    pub include_barriers: bool,
    /// Spot × volatility grid to revalue under.
    pub scenario_grid: Option<ScenarioGrid>,
    /// Preset stress scenarios to revalue under.
    pub presets: Vec<PresetScenarioType>,
}

impl ValuationOptions {
    /// Value only.
    pub fn value_only() -> Self {
        Self::default()
    }

    /// Sets the model override.
    pub fn with_model(mut self, model: ModelType) -> Self {
        self.model = Some(model);
        self
    }

    /// Requests Greeks.
    pub fn with_greeks(mut self) -> Self {
        self.include_greeks = true;
        self
    }

    /// Requests barrier statuses.
    pub fn with_barriers(mut self) -> Self {
        self.include_barriers = true;
        self
    }

    /// Requests a scenario grid.
    pub fn with_scenarios(mut self, grid: ScenarioGrid) -> Self {
        self.scenario_grid = Some(grid);
        self
    }

    /// Requests preset stress scenarios.
    pub fn with_presets(mut self, presets: &[PresetScenarioType]) -> Self {
        self.presets = presets.to_vec();
        self
    }

    fn wants_scenarios(&self) -> bool {
        self.scenario_grid.is_some() || !self.presets.is_empty()
    }
}

/// Result of one valuation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Instrument identifier.
    pub instrument_id: String,
    /// Value for the full notional.
    pub value: f64,
    /// Value per unit notional.
    pub unit_value: f64,
    /// Model used.
    pub model: ModelType,
    /// Model-specific diagnostics.
    pub diagnostics: ModelDiagnostics,
    /// Greeks, when requested.
    pub greeks: Option<GreeksResult>,
    /// Barrier statuses, when requested.
    pub barrier_statuses: Option<Vec<BarrierStatus>>,
    /// Scenario P&L, when requested.
    pub scenarios: Option<ScenarioAnalysis>,
    /// Non-fatal conditions.
    pub warnings: Vec<String>,
    /// Wall-clock time of the call.
    pub calculation_time_ms: f64,
}

/// Valuation façade over the pricing engines.
///
/// # Examples
///
/// ```
/// use pricer_core::market_data::{MarketSnapshot, UnderlyingQuote};
/// use pricer_core::types::{Currency, Date};
/// use pricer_models::instruments::{EquityOption, ExerciseStyle, Instrument, InstrumentTerms, OptionType};
/// use pricer_risk::orchestrator::{ValuationEngine, ValuationOptions};
///
/// let as_of = Date::from_ymd(2024, 1, 2).unwrap();
/// let terms = InstrumentTerms::new("OPT-1", Currency::USD, as_of, Date::from_ymd(2025, 1, 1).unwrap(), 1.0);
/// let option: Instrument = EquityOption::new(terms, "ACME", 100.0, OptionType::Call, ExerciseStyle::European)
///     .unwrap()
///     .into();
/// let snapshot = MarketSnapshot::new(as_of, 0.05).with_quote(UnderlyingQuote::new("ACME", 100.0, 0.2));
///
/// let engine = ValuationEngine::with_defaults().unwrap();
/// let result = engine.valuate(&option, &snapshot, &ValuationOptions::default().with_greeks()).unwrap();
/// assert!(result.value > 10.0);
/// assert!(result.greeks.is_some());
/// ```
pub struct ValuationEngine {
    config: EngineConfig,
    pricer: Pricer,
    greeks: GreeksCalculator,
    barriers: BarrierEvaluator,
    store: Arc<BarrierStateStore>,
    implied_vol: ImpliedVolSolver,
    margin: MarginCalculator,
    pool: ThreadPool,
}

impl std::fmt::Debug for ValuationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValuationEngine")
            .field("config", &self.config)
            .field("threads", &self.pool.current_num_threads())
            .field("tracked_barriers", &self.store.len())
            .finish()
    }
}

impl ValuationEngine {
    /// Engine built from `config` with a fresh barrier store.
    pub fn new(config: EngineConfig) -> Result<Self, PricingError> {
        Self::with_store(config, Arc::new(BarrierStateStore::new()))
    }

    /// Engine with default configuration.
    pub fn with_defaults() -> Result<Self, PricingError> {
        Self::new(EngineConfig::default())
    }

    /// Engine sharing an existing barrier store.
    pub fn with_store(config: EngineConfig, store: Arc<BarrierStateStore>) -> Result<Self, PricingError> {
        config.validate()?;
        let pricer = Pricer::new(config.pricing_settings()?)?;
        let greeks = GreeksCalculator::with_bumps(pricer.clone(), config.greeks)?;
        let implied_vol = ImpliedVolSolver::new(config.implied_vol)?;
        let margin = MarginCalculator::new(pricer.clone(), config.margin);
        let threads = config.parallel.threads();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pricer-worker-{}", i))
            .build()
            .map_err(|e| PricingError::Config(format!("failed to build worker pool: {}", e)))?;
        debug!(threads, "valuation engine ready");
        Ok(Self {
            barriers: BarrierEvaluator::from_config(&config.barrier),
            config,
            pricer,
            greeks,
            store,
            implied_vol,
            margin,
            pool,
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Instrument pricer.
    pub fn pricer(&self) -> &Pricer {
        &self.pricer
    }

    /// Barrier hit-state store.
    pub fn barrier_store(&self) -> &Arc<BarrierStateStore> {
        &self.store
    }

    /// Barrier evaluator.
    pub fn barrier_evaluator(&self) -> &BarrierEvaluator {
        &self.barriers
    }

    /// Worker threads in the pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `op` on the engine's worker pool.
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.pool.install(op)
    }

    /// Values `instrument` and adds what `options` asks for.
    ///
    /// # Errors
    ///
    /// Input errors are raised before any model runs; engine failures are
    /// returned as their typed errors.
    pub fn valuate(
        &self,
        instrument: &Instrument,
        snapshot: &MarketSnapshot,
        options: &ValuationOptions,
    ) -> Result<ValuationResult, PricingError> {
        let start = Instant::now();
        let model = options.model.unwrap_or_else(|| select_model(instrument));
        let span = info_span!("valuate", instrument = instrument.instrument_id(), model = %model);
        let _guard = span.enter();

        self.install(|| {
            let barrier_statuses = if options.include_barriers {
                Some(self.barriers.evaluate(instrument, snapshot, &self.store)?)
            } else {
                None
            };
            let instrument = self.with_recorded_hits(instrument)?;
            let instrument = instrument.as_ref();

            let outcome = self.pricer.price(instrument, snapshot, model)?;
            let mut warnings = outcome.warnings.clone();
            for status in barrier_statuses.iter().flatten() {
                merge(&mut warnings, &status.warnings);
            }

            let greeks = if options.include_greeks {
                let greeks = self.greeks.calculate(instrument, snapshot, Some(model))?;
                merge(&mut warnings, &greeks.warnings);
                Some(greeks)
            } else {
                None
            };

            let scenarios = if options.wants_scenarios() {
                let mut engine = options
                    .scenario_grid
                    .as_ref()
                    .map(ScenarioEngine::from_grid)
                    .unwrap_or_default();
                for preset in &options.presets {
                    engine.add_scenario(preset.name(), preset.shock());
                }
                Some(engine.execute(snapshot, |s| self.pricer.price(instrument, s, model))?)
            } else {
                None
            };

            let calculation_time_ms = start.elapsed().as_secs_f64() * 1_000.0;
            debug!(value = outcome.value, calculation_time_ms, "valuation complete");
            Ok(ValuationResult {
                instrument_id: instrument.instrument_id().to_string(),
                value: outcome.value,
                unit_value: outcome.unit_value,
                model: outcome.model,
                diagnostics: outcome.diagnostics,
                greeks,
                barrier_statuses,
                scenarios,
                warnings,
                calculation_time_ms,
            })
        })
    }

    /// Price only, through the engine pool.
    pub fn price(
        &self,
        instrument: &Instrument,
        snapshot: &MarketSnapshot,
        model: Option<ModelType>,
    ) -> Result<PriceOutcome, PricingError> {
        let model = model.unwrap_or_else(|| select_model(instrument));
        let instrument = self.with_recorded_hits(instrument)?;
        self.install(|| self.pricer.price(instrument.as_ref(), snapshot, model))
    }

    /// Greeks through the engine pool.
    pub fn greeks(
        &self,
        instrument: &Instrument,
        snapshot: &MarketSnapshot,
        model: Option<ModelType>,
    ) -> Result<GreeksResult, PricingError> {
        let instrument = self.with_recorded_hits(instrument)?;
        self.install(|| self.greeks.calculate(instrument.as_ref(), snapshot, model))
    }

    /// Implied volatility analysis against `quote`'s history and term
    /// structure.
    pub fn implied_volatility(
        &self,
        inputs: &ImpliedVolInputs,
        quote: &UnderlyingQuote,
    ) -> Result<ImpliedVolatilityAnalysis, PricingError> {
        self.implied_vol.analyse(inputs, quote)
    }

    /// Barrier statuses with an optional threshold override.
    pub fn monitor_barriers(
        &self,
        instrument: &Instrument,
        snapshot: &MarketSnapshot,
        alert_threshold_pct: Option<f64>,
    ) -> Result<Vec<BarrierStatus>, PricingError> {
        let evaluator = match alert_threshold_pct {
            Some(pct) => self.barriers.with_alert_threshold(pct)?,
            None => self.barriers,
        };
        evaluator.evaluate(instrument, snapshot, &self.store)
    }

    /// Scenario P&L under explicit shocks.
    pub fn run_scenarios(
        &self,
        instrument: &Instrument,
        snapshot: &MarketSnapshot,
        shocks: &[(String, MarketShock)],
        model: Option<ModelType>,
    ) -> Result<ScenarioAnalysis, PricingError> {
        let model = model.unwrap_or_else(|| select_model(instrument));
        let instrument = self.with_recorded_hits(instrument)?;
        let mut engine = ScenarioEngine::new();
        for (name, shock) in shocks {
            engine.add_scenario(name.clone(), *shock);
        }
        self.install(|| engine.execute(snapshot, |s| self.pricer.price(instrument.as_ref(), s, model)))
    }

    /// SPAN-style margin of `positions`.
    pub fn margin(
        &self,
        positions: &[MarginPosition],
        snapshot: &MarketSnapshot,
        custom: Option<&[MarketShock]>,
    ) -> Result<MarginCalculationResult, PricingError> {
        let positions = positions
            .iter()
            .map(|p| {
                let instrument = self.with_recorded_hits(&p.instrument)?.into_owned();
                Ok(MarginPosition::new(instrument, p.quantity))
            })
            .collect::<Result<Vec<_>, PricingError>>()?;
        self.install(|| self.margin.calculate(&positions, snapshot, custom))
    }

    /// Copy of `instrument` carrying the hit states recorded in the store.
    fn with_recorded_hits<'a>(&self, instrument: &'a Instrument) -> Result<Cow<'a, Instrument>, PricingError> {
        if instrument.barriers().is_empty() || self.store.is_empty() {
            return Ok(Cow::Borrowed(instrument));
        }
        let instrument_id = instrument.instrument_id();
        let mut updated = instrument.clone();
        for barrier in updated.barriers_mut() {
            let key = BarrierKey::new(instrument_id, barrier.id.clone());
            barrier.hit_state = self.store.current(&key, barrier.hit_state)?.hit_state;
        }
        Ok(Cow::Owned(updated))
    }
}

fn merge(into: &mut Vec<String>, from: &[String]) {
    for w in from {
        if !into.contains(w) {
            warn!("{}", w);
            into.push(w.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_core::types::{Currency, Date};
    use pricer_models::instruments::{
        BarrierFeature, BarrierType, EquityOption, ExerciseStyle, InstrumentTerms, OptionType, PayoffParams,
        StructuredProduct, UnderlyingAsset,
    };
    use crate::barrier::BarrierState;

    fn as_of() -> Date {
        Date::from_ymd(2024, 1, 2).unwrap()
    }

    fn terms(id: &str, notional: f64) -> InstrumentTerms {
        InstrumentTerms::new(id, Currency::USD, as_of(), Date::from_ymd(2025, 1, 1).unwrap(), notional)
    }

    fn call(exercise: ExerciseStyle) -> Instrument {
        EquityOption::new(terms("OPT", 1.0), "ACME", 100.0, OptionType::Call, exercise)
            .unwrap()
            .into()
    }

    fn knock_out_note() -> Instrument {
        knock_out_note_on("NOTE", "ACME")
    }

    fn knock_out_note_on(id: &str, underlying: &str) -> Instrument {
        StructuredProduct::new(
            terms(id, 1_000.0),
            vec![UnderlyingAsset::new(underlying, 100.0, 140.0)],
            vec![BarrierFeature::new("KO", BarrierType::DownAndOut, underlying, 0.7).with_rebate(0.5)],
            PayoffParams::participation(1.0).unwrap(),
        )
        .unwrap()
        .into()
    }

    fn snapshot(spot: f64) -> MarketSnapshot {
        MarketSnapshot::new(as_of(), 0.05).with_quote(UnderlyingQuote::new("ACME", spot, 0.2))
    }

    fn engine() -> ValuationEngine {
        let mut config = EngineConfig::default();
        config.monte_carlo.paths = 4_000;
        config.parallel.worker_threads = 2;
        ValuationEngine::new(config).unwrap()
    }

    #[test]
    fn test_valuate_european_call() {
        let result = engine()
            .valuate(&call(ExerciseStyle::European), &snapshot(100.0), &ValuationOptions::value_only())
            .unwrap();
        assert_eq!(result.model, ModelType::ClosedForm);
        assert_eq!(result.instrument_id, "OPT");
        assert!(result.greeks.is_none());
        assert!(result.calculation_time_ms >= 0.0);
        assert!(result.value > 10.0 && result.value < 11.0);
    }

    #[test]
    fn test_american_uses_lattice_with_depth() {
        let result = engine()
            .valuate(&call(ExerciseStyle::American), &snapshot(100.0), &ValuationOptions::value_only())
            .unwrap();
        assert_eq!(result.model, ModelType::Binomial);
        assert_eq!(result.diagnostics.lattice_steps, Some(500));
    }

    #[test]
    fn test_greeks_and_scenarios_requested() {
        let options = ValuationOptions::default()
            .with_greeks()
            .with_scenarios(ScenarioGrid::default())
            .with_presets(&[PresetScenarioType::MarketCrash]);
        let result = engine()
            .valuate(&call(ExerciseStyle::European), &snapshot(100.0), &options)
            .unwrap();
        let greeks = result.greeks.unwrap();
        assert_relative_eq!(greeks.price, result.value, epsilon = 1e-12);
        let scenarios = result.scenarios.unwrap();
        assert_eq!(scenarios.scenario_count(), 22);
        assert_relative_eq!(scenarios.base_value, result.value, epsilon = 1e-12);
        let crash = scenarios.results.last().unwrap();
        assert_eq!(crash.scenario_name, "Market Crash");
    }

    #[test]
    fn test_barrier_hit_is_recorded_and_priced() {
        let engine = engine();
        let note = knock_out_note();
        let options = ValuationOptions::default().with_barriers();

        let live = engine.valuate(&note, &snapshot(120.0), &options).unwrap();
        assert_eq!(live.model, ModelType::MonteCarlo);
        assert_eq!(live.barrier_statuses.as_ref().unwrap()[0].state, BarrierState::Safe);

        let hit = engine.valuate(&note, &snapshot(97.0), &options).unwrap();
        assert_eq!(hit.barrier_statuses.as_ref().unwrap()[0].state, BarrierState::Hit);
        // knocked out: rebate only
        assert_relative_eq!(hit.value, 500.0, epsilon = 1e-9);

        // the store keeps the hit after spot recovers
        let later = engine.valuate(&note, &snapshot(130.0), &ValuationOptions::default()).unwrap();
        assert_relative_eq!(later.value, 500.0, epsilon = 1e-9);
        assert!(!later.warnings.is_empty());
    }

    #[test]
    fn test_hit_on_one_note_leaves_same_named_barrier_elsewhere_alive() {
        let engine = engine();
        let note_a = knock_out_note_on("NOTE-A", "AAA");
        let note_b = knock_out_note_on("NOTE-B", "BBB");
        let snapshot = MarketSnapshot::new(as_of(), 0.05)
            .with_quote(UnderlyingQuote::new("AAA", 90.0, 0.2))
            .with_quote(UnderlyingQuote::new("BBB", 140.0, 0.2));

        let before = engine.valuate(&note_b, &snapshot, &ValuationOptions::default()).unwrap();
        assert!(before.value > 500.0);

        let hit = engine.valuate(&note_a, &snapshot, &ValuationOptions::default().with_barriers()).unwrap();
        assert_eq!(hit.barrier_statuses.as_ref().unwrap()[0].state, BarrierState::Hit);
        assert_relative_eq!(hit.value, 500.0, epsilon = 1e-9);

        let after = engine.valuate(&note_b, &snapshot, &ValuationOptions::default()).unwrap();
        assert_relative_eq!(after.value, before.value, epsilon = 1e-12);
        assert!(after.warnings.iter().all(|w| !w.contains("terminated")));
    }

    #[test]
    fn test_margin_uses_recorded_hits() {
        let engine = engine();
        let note = knock_out_note();
        engine
            .valuate(&note, &snapshot(97.0), &ValuationOptions::default().with_barriers())
            .unwrap();

        let result = engine
            .margin(&[MarginPosition::new(note, 1.0)], &snapshot(130.0), None)
            .unwrap();
        assert_relative_eq!(result.position_margins[0].base_value, 500.0, epsilon = 1e-9);
        assert_relative_eq!(result.span_margin, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_barrier_warnings_reach_result() {
        let engine = engine();
        let note = knock_out_note();
        let hit_snapshot = MarketSnapshot::new(as_of(), 0.05).with_quote(UnderlyingQuote::new("ACME", 97.0, 0.0));
        let result = engine
            .valuate(&note, &hit_snapshot, &ValuationOptions::default().with_barriers())
            .unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("non-positive volatility")));
    }

    #[test]
    fn test_model_override_mismatch_is_typed_error() {
        let note = knock_out_note();
        let err = engine()
            .valuate(&note, &snapshot(120.0), &ValuationOptions::default().with_model(ModelType::ClosedForm))
            .unwrap_err();
        assert!(matches!(err, PricingError::UnsupportedModel { .. }));
    }

    #[test]
    fn test_non_positive_volatility_rejected() {
        let snapshot = MarketSnapshot::new(as_of(), 0.05).with_quote(UnderlyingQuote::new("ACME", 100.0, 0.0));
        let err = engine()
            .valuate(&call(ExerciseStyle::European), &snapshot, &ValuationOptions::default())
            .unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_expired_instrument_warns() {
        let late = snapshot(110.0).with_date_shift(400);
        let result = engine()
            .valuate(&call(ExerciseStyle::European), &late, &ValuationOptions::default())
            .unwrap();
        assert_relative_eq!(result.value, 10.0, epsilon = 1e-9);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_pool_size_from_config() {
        assert_eq!(engine().threads(), 2);
    }
}
