//! Instrument-level pricing across the three engines.
//!
//! [`Pricer`] turns an [`Instrument`] and a [`MarketSnapshot`] into engine
//! inputs, runs the requested engine and scales the per-unit value by the
//! instrument notional.
//!
//! Boundary handling:
//! - time to expiry ≤ 0: intrinsic value with a warning
//! - volatility ≤ 0: `InvalidInput` for options and structured products,
//!   a warning for futures (their value does not depend on it)
//! - a structured product already knocked out or autocalled: rebate or zero
//!   with a warning

use pricer_core::market_data::{MarketSnapshot, UnderlyingQuote};
use pricer_core::types::{time_to_maturity_dates, Date, PricingError};
use pricer_models::instruments::{
    BarrierEffect, BarrierObservation, BarrierType, EquityOption, ExerciseStyle, Future,
    Instrument, StructuredProduct,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analytical::{
    coupon_value, future_greeks, replicate_redemption, BlackScholes, ReplicationInputs,
    EXPIRY_EPSILON,
};
use crate::lattice::{step_for_time, BinomialTree, LatticeParams, LatticeSpec, NodeBarrier, NodePayoff};
use crate::mc::{
    AssetDynamics, MonteCarloConfig, MonteCarloEngine, PathBarrier, PathObservation, PathPayoff,
    PathProduct, SimulationInputs,
};
use crate::selector::{ensure_supported, select_model, ModelType};

/// Default lattice depth.
pub const DEFAULT_LATTICE_STEPS: usize = 500;

/// Engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingSettings {
    /// Binomial tree depth.
    pub lattice_steps: usize,
    /// Monte Carlo configuration.
    pub monte_carlo: MonteCarloConfig,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            lattice_steps: DEFAULT_LATTICE_STEPS,
            monte_carlo: MonteCarloConfig::default(),
        }
    }
}

/// Engine-specific diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDiagnostics {
    /// Lattice depth.
    pub lattice_steps: Option<usize>,
    /// Monte Carlo samples used.
    pub paths: Option<usize>,
    /// Monte Carlo time steps per path.
    pub time_steps: Option<usize>,
    /// Monte Carlo standard error, in instrument value units.
    pub std_error: Option<f64>,
    /// Monte Carlo 95% half-width, in instrument value units.
    pub confidence_95: Option<f64>,
    /// Whether a step budget or deadline shortened the run.
    pub early_stop: bool,
}

/// Result of pricing one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceOutcome {
    /// Value of the position (`unit_value · notional`).
    pub value: f64,
    /// Value per option, contract or unit notional.
    pub unit_value: f64,
    /// Engine used.
    pub model: ModelType,
    /// Engine diagnostics.
    pub diagnostics: ModelDiagnostics,
    /// Non-fatal conditions.
    pub warnings: Vec<String>,
}

/// Per-unit engine output before scaling.
struct UnitValue {
    value: f64,
    diagnostics: ModelDiagnostics,
}

impl UnitValue {
    fn plain(value: f64) -> Self {
        Self {
            value,
            diagnostics: ModelDiagnostics::default(),
        }
    }
}

/// Prices instruments against market snapshots.
#[derive(Debug, Clone)]
pub struct Pricer {
    settings: PricingSettings,
    monte_carlo: MonteCarloEngine,
}

impl Pricer {
    /// Creates a pricer after validating `settings`.
    pub fn new(settings: PricingSettings) -> Result<Self, PricingError> {
        if settings.lattice_steps == 0 {
            return Err(PricingError::Config("lattice steps must be positive".to_string()));
        }
        let monte_carlo = MonteCarloEngine::new(settings.monte_carlo.clone())?;
        Ok(Self {
            settings,
            monte_carlo,
        })
    }

    /// Pricer with default settings.
    pub fn with_defaults() -> Self {
        Self {
            settings: PricingSettings::default(),
            monte_carlo: MonteCarloEngine::default(),
        }
    }

    /// Engine settings.
    pub fn settings(&self) -> &PricingSettings {
        &self.settings
    }

    /// Prices with the engine chosen by [`select_model`].
    pub fn price_auto(&self, instrument: &Instrument, snapshot: &MarketSnapshot) -> Result<PriceOutcome, PricingError> {
        self.price(instrument, snapshot, select_model(instrument))
    }

    /// Prices with an explicit engine.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for malformed instruments or unusable market data
    /// - `MarketDataUnavailable` when an underlying has no quote
    /// - `UnsupportedModel` when `model` cannot value the instrument
    /// - `InternalConsistency` when an engine yields a non-finite value
    pub fn price(
        &self,
        instrument: &Instrument,
        snapshot: &MarketSnapshot,
        model: ModelType,
    ) -> Result<PriceOutcome, PricingError> {
        instrument.validate()?;
        ensure_supported(model, instrument)?;

        let mut warnings = Vec::new();
        if snapshot.risk_free_rate < 0.0 {
            push_warning(&mut warnings, format!("negative risk-free rate {}", snapshot.risk_free_rate));
        }
        let mut quotes = Vec::new();
        for symbol in instrument.underlyings() {
            let quote = snapshot.quote(symbol)?;
            if !(quote.spot.is_finite() && quote.spot > 0.0) {
                return Err(PricingError::InvalidInput(format!(
                    "spot for {} must be positive, got {}",
                    symbol, quote.spot
                )));
            }
            if quote.dividend_yield < 0.0 {
                push_warning(
                    &mut warnings,
                    format!("negative dividend yield {} for {}", quote.dividend_yield, symbol),
                );
            }
            quotes.push(quote);
        }

        let expiry = instrument.time_to_expiry(snapshot.as_of);
        let unit = if expiry <= EXPIRY_EPSILON {
            push_warning(
                &mut warnings,
                format!(
                    "{} expired ({:.4} years to expiry); valued at intrinsic",
                    instrument.instrument_id(),
                    expiry
                ),
            );
            UnitValue::plain(expired_value(instrument, &quotes))
        } else if let Some(value) = self.terminated_value(instrument, &mut warnings) {
            UnitValue::plain(value)
        } else {
            for quote in &quotes {
                if quote.volatility <= 0.0 {
                    let msg = format!("non-positive volatility {} for {}", quote.volatility, quote.symbol);
                    if matches!(instrument, Instrument::Future(_)) {
                        push_warning(&mut warnings, msg);
                    } else {
                        return Err(PricingError::InvalidInput(msg));
                    }
                }
            }
            match model {
                ModelType::ClosedForm => self.closed_form(instrument, snapshot, &quotes, expiry)?,
                ModelType::Binomial => self.binomial(instrument, snapshot, &quotes, expiry)?,
                ModelType::MonteCarlo => self.monte_carlo(instrument, snapshot, &quotes, expiry, &mut warnings)?,
            }
        };

        if !unit.value.is_finite() {
            return Err(PricingError::InternalConsistency(format!(
                "{} engine produced non-finite value for {}",
                model,
                instrument.instrument_id()
            )));
        }
        let notional = instrument.notional();
        let mut diagnostics = unit.diagnostics;
        diagnostics.std_error = diagnostics.std_error.map(|se| se * notional);
        diagnostics.confidence_95 = diagnostics.confidence_95.map(|ci| ci * notional);

        debug!(
            instrument = instrument.instrument_id(),
            model = %model,
            unit_value = unit.value,
            "priced instrument"
        );

        Ok(PriceOutcome {
            value: unit.value * notional,
            unit_value: unit.value,
            model,
            diagnostics,
            warnings,
        })
    }

    fn terminated_value(&self, instrument: &Instrument, warnings: &mut Vec<String>) -> Option<f64> {
        let Instrument::StructuredProduct(product) = instrument else {
            return None;
        };
        let barrier = product.termination()?;
        let value = match barrier.barrier_type.effect() {
            BarrierEffect::EarlyRedemption => 0.0,
            _ => barrier.rebate,
        };
        push_warning(
            warnings,
            format!(
                "{} terminated by {} barrier {}; remaining value {}",
                product.terms.instrument_id,
                barrier.barrier_type.name(),
                barrier.id,
                value
            ),
        );
        Some(value)
    }

    fn closed_form(
        &self,
        instrument: &Instrument,
        snapshot: &MarketSnapshot,
        quotes: &[&UnderlyingQuote],
        expiry: f64,
    ) -> Result<UnitValue, PricingError> {
        let quote = primary(quotes)?;
        let rate = snapshot.risk_free_rate;
        let value = match instrument {
            Instrument::Option(option) => {
                let bs = BlackScholes::new(quote.spot, rate, quote.dividend_yield, quote.volatility)?;
                bs.price(option.strike, expiry, option.option_type)
            }
            Instrument::Future(future) => {
                future_greeks(quote.spot, future.contract_price, rate, quote.dividend_yield, expiry).price
            }
            Instrument::StructuredProduct(product) => {
                let bs = BlackScholes::new(quote.spot, rate, quote.dividend_yield, quote.volatility)?;
                let initial_level = product.underlyings[0].initial_level;
                let inputs = ReplicationInputs {
                    spot: quote.spot,
                    initial_level,
                    rate,
                    dividend: quote.dividend_yield,
                    expiry,
                };
                replicate_redemption(&bs, &product.payoff, &inputs)
                    + coupon_value(&product.coupon_schedule, rate, |c| {
                        time_to_maturity_dates(snapshot.as_of, c.date)
                    })
            }
        };
        Ok(UnitValue::plain(value))
    }

    fn binomial(
        &self,
        instrument: &Instrument,
        snapshot: &MarketSnapshot,
        quotes: &[&UnderlyingQuote],
        expiry: f64,
    ) -> Result<UnitValue, PricingError> {
        let quote = primary(quotes)?;
        let steps = self.settings.lattice_steps;
        let as_of = snapshot.as_of;
        let step_of = |date: Date| step_for_time(time_to_maturity_dates(as_of, date), expiry, steps);
        let params = LatticeParams {
            spot: quote.spot,
            rate: snapshot.risk_free_rate,
            dividend: quote.dividend_yield,
            volatility: quote.volatility,
            expiry,
        };

        let spec = match instrument {
            Instrument::Option(option) => option_lattice(option, steps, step_of),
            Instrument::Future(future) => LatticeSpec::new(
                NodePayoff::Forward {
                    contract: future.contract_price,
                },
                steps,
            ),
            Instrument::StructuredProduct(product) => note_lattice(product, steps, step_of),
        };

        let result = BinomialTree::new(steps).price(&params, &spec)?;
        debug!(steps = result.steps, probability = result.probability, "lattice valuation");
        Ok(UnitValue {
            value: result.value,
            diagnostics: ModelDiagnostics {
                lattice_steps: Some(result.steps),
                ..ModelDiagnostics::default()
            },
        })
    }

    fn monte_carlo(
        &self,
        instrument: &Instrument,
        snapshot: &MarketSnapshot,
        quotes: &[&UnderlyingQuote],
        expiry: f64,
        warnings: &mut Vec<String>,
    ) -> Result<UnitValue, PricingError> {
        let rate = snapshot.risk_free_rate;
        let assets: Vec<AssetDynamics> = quotes
            .iter()
            .map(|q| AssetDynamics {
                spot: q.spot,
                volatility: q.volatility,
                dividend: q.dividend_yield,
            })
            .collect();
        let correlation = if quotes.len() > 1 {
            let symbols: Vec<&str> = quotes.iter().map(|q| q.symbol.as_str()).collect();
            Some(snapshot.correlation_matrix(&symbols)?.cholesky()?)
        } else {
            None
        };
        let inputs = SimulationInputs {
            assets,
            rate,
            expiry,
            correlation,
        };

        let product = match instrument {
            Instrument::Option(option) => PathProduct::terminal(PathPayoff::Vanilla {
                option_type: option.option_type,
                strike: option.strike,
            }),
            Instrument::Future(future) => PathProduct::terminal(PathPayoff::Forward {
                contract: future.contract_price,
            }),
            Instrument::StructuredProduct(product) => {
                if product.has_early_redemption_schedule() {
                    push_warning(
                        warnings,
                        format!(
                            "call/put schedule of {} ignored by Monte Carlo",
                            product.terms.instrument_id
                        ),
                    );
                }
                note_paths(product, snapshot.as_of)
            }
        };

        let result = self.monte_carlo.run(&inputs, &product)?;
        for msg in result.warnings {
            warnings.push(msg);
        }
        Ok(UnitValue {
            value: result.price,
            diagnostics: ModelDiagnostics {
                paths: Some(result.samples),
                time_steps: Some(result.time_steps),
                std_error: Some(result.std_error),
                confidence_95: Some(result.confidence_95),
                early_stop: result.early_stop,
                ..ModelDiagnostics::default()
            },
        })
    }
}

impl Default for Pricer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn push_warning(warnings: &mut Vec<String>, msg: String) {
    warn!("{}", msg);
    warnings.push(msg);
}

fn primary<'a>(quotes: &[&'a UnderlyingQuote]) -> Result<&'a UnderlyingQuote, PricingError> {
    quotes
        .first()
        .copied()
        .ok_or_else(|| PricingError::InvalidInput("instrument has no underlying".to_string()))
}

fn option_lattice<F>(option: &EquityOption, steps: usize, step_of: F) -> LatticeSpec
where
    F: Fn(Date) -> Option<usize>,
{
    let spec = LatticeSpec::new(
        NodePayoff::Vanilla {
            option_type: option.option_type,
            strike: option.strike,
        },
        steps,
    );
    match &option.exercise {
        ExerciseStyle::European => spec,
        ExerciseStyle::American => spec.american(),
        ExerciseStyle::Bermudan { exercise_dates } => {
            let mut flags: Vec<usize> = exercise_dates.iter().filter_map(|d| step_of(*d)).collect();
            flags.push(steps);
            spec.with_exercise_steps(&flags)
        }
    }
}

fn note_lattice<F>(product: &StructuredProduct, steps: usize, step_of: F) -> LatticeSpec
where
    F: Fn(Date) -> Option<usize>,
{
    let initial_level = product.underlyings[0].initial_level;
    let mut spec = LatticeSpec::new(
        NodePayoff::Note {
            payoff: product.payoff,
            initial_level,
        },
        steps,
    );
    for barrier in &product.barriers {
        let value_if_hit = match barrier.barrier_type.effect() {
            BarrierEffect::KnockOut => barrier.rebate,
            BarrierEffect::EarlyRedemption => 1.0 + barrier.coupon,
            _ => continue,
        };
        let observed = match &barrier.observation {
            BarrierObservation::Continuous => vec![true; steps + 1],
            BarrierObservation::Discrete { dates } => {
                let mut flags = vec![false; steps + 1];
                for step in dates.iter().filter_map(|d| step_of(*d)) {
                    flags[step] = true;
                }
                flags
            }
        };
        spec = spec.with_barrier(NodeBarrier {
            direction: barrier.direction(),
            level: barrier.resolve_level(initial_level),
            value_if_hit,
            observed,
        });
    }
    for call in &product.call_schedule {
        if let Some(step) = step_of(call.date) {
            spec = spec.with_call(step, call.amount);
        }
    }
    for put in &product.put_schedule {
        if let Some(step) = step_of(put.date) {
            spec = spec.with_put(step, put.amount);
        }
    }
    for coupon in &product.coupon_schedule {
        if let Some(step) = step_of(coupon.date) {
            spec = spec.with_coupon(step, coupon.amount);
        }
    }
    spec
}

fn note_paths(product: &StructuredProduct, as_of: Date) -> PathProduct {
    let payoff = PathPayoff::Note {
        payoff: product.payoff,
        weights: product.weight_fractions(),
        initial_levels: product.underlyings.iter().map(|a| a.initial_level).collect(),
    };
    let coupons = product
        .coupon_schedule
        .iter()
        .map(|c| (time_to_maturity_dates(as_of, c.date), c.amount))
        .collect();
    let mut paths = PathProduct::terminal(payoff).with_coupons(coupons);
    for barrier in &product.barriers {
        let Some(asset) = product.underlyings.iter().position(|a| a.symbol == barrier.underlying) else {
            continue;
        };
        let observation = match &barrier.observation {
            BarrierObservation::Continuous => PathObservation::Continuous,
            BarrierObservation::Discrete { dates } => {
                PathObservation::Times(dates.iter().map(|d| time_to_maturity_dates(as_of, *d)).collect())
            }
        };
        paths = paths.with_barrier(PathBarrier {
            asset,
            barrier_type: barrier.barrier_type,
            level: barrier.resolve_level(product.underlyings[asset].initial_level),
            observation,
            rebate: barrier.rebate,
            coupon: barrier.coupon,
            already_hit: barrier.hit_state.has_been_hit,
        });
    }
    paths
}

/// Per-unit value at or after expiry.
fn expired_value(instrument: &Instrument, quotes: &[&UnderlyingQuote]) -> f64 {
    match instrument {
        Instrument::Option(option) => quotes.first().map_or(0.0, |q| option.payoff(q.spot)),
        Instrument::Future(Future { contract_price, .. }) => {
            quotes.first().map_or(0.0, |q| q.spot - contract_price)
        }
        Instrument::StructuredProduct(product) => {
            if let Some(barrier) = product.termination() {
                return match barrier.barrier_type.effect() {
                    BarrierEffect::EarlyRedemption => 0.0,
                    _ => barrier.rebate,
                };
            }
            let finals: Vec<f64> = quotes.iter().map(|q| q.spot).collect();
            let perf = product.performance(&finals);
            let mut value = product.payoff.redemption(perf);
            for barrier in &product.barriers {
                let spot = quotes
                    .iter()
                    .find(|q| q.symbol == barrier.underlying)
                    .map_or(f64::NAN, |q| q.spot);
                let level = product
                    .asset(&barrier.underlying)
                    .map_or(barrier.level, |a| barrier.resolve_level(a.initial_level));
                match barrier.barrier_type {
                    BarrierType::DownAndIn if barrier.hit_state.has_been_hit || spot <= level => {
                        value = value.min(perf)
                    }
                    BarrierType::UpAndIn if !(barrier.hit_state.has_been_hit || spot >= level) => value = 1.0,
                    BarrierType::CapitalProtection if spot <= level => value = value.min(perf),
                    _ => {}
                }
            }
            value
        }
    }
}
