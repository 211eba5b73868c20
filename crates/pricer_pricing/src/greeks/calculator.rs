//! Greeks by analytic formula or bump-and-revalue.
//!
//! Closed-form options and futures use the analytic Black–Scholes Greeks.
//! Every other combination is revalued on bumped snapshots with the same
//! pricer, so Monte Carlo revaluations share the seed (common random
//! numbers) and the noise largely cancels in the differences.

use pricer_core::market_data::MarketSnapshot;
use pricer_core::types::PricingError;
use pricer_models::instruments::Instrument;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::result::GreeksResult;
use crate::analytical::{future_greeks, AnalyticGreeks, BlackScholes, EXPIRY_EPSILON};
use crate::pricer::Pricer;
use crate::selector::{select_model, ModelType};

/// Finite-difference bump sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreeksBumps {
    /// Relative spot bump (0.01 = 1%).
    pub spot_pct: f64,
    /// Absolute volatility bump (0.01 = one point).
    pub vol_abs: f64,
    /// Absolute rate bump.
    pub rate_abs: f64,
    /// Calendar days for theta.
    pub time_days: i64,
}

impl Default for GreeksBumps {
    fn default() -> Self {
        Self {
            spot_pct: 0.01,
            vol_abs: 0.01,
            rate_abs: 0.01,
            time_days: 1,
        }
    }
}

impl GreeksBumps {
    /// Checks that every bump is positive.
    pub fn validate(&self) -> Result<(), PricingError> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(PricingError::Config(format!("{} bump must be positive, got {}", name, v)))
            }
        };
        positive("spot", self.spot_pct)?;
        positive("volatility", self.vol_abs)?;
        positive("rate", self.rate_abs)?;
        if self.time_days <= 0 {
            return Err(PricingError::Config(format!(
                "time bump must be at least one day, got {}",
                self.time_days
            )));
        }
        Ok(())
    }
}

/// Greeks calculator.
///
/// # Examples
///
/// ```
/// use pricer_pricing::greeks::GreeksCalculator;
/// use pricer_pricing::pricer::Pricer;
/// use pricer_core::market_data::{MarketSnapshot, UnderlyingQuote};
/// use pricer_core::types::{Currency, Date};
/// use pricer_models::instruments::{EquityOption, ExerciseStyle, Instrument, InstrumentTerms, OptionType};
///
/// let as_of = Date::from_ymd(2024, 1, 2).unwrap();
/// let terms = InstrumentTerms::new("OPT", Currency::USD, as_of, Date::from_ymd(2025, 1, 1).unwrap(), 1.0);
/// let option: Instrument = EquityOption::new(terms, "ACME", 100.0, OptionType::Call, ExerciseStyle::European)
///     .unwrap()
///     .into();
/// let snapshot = MarketSnapshot::new(as_of, 0.05).with_quote(UnderlyingQuote::new("ACME", 100.0, 0.2));
///
/// let greeks = GreeksCalculator::new(Pricer::default()).calculate(&option, &snapshot, None).unwrap();
/// assert!((greeks.delta - 0.6368).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct GreeksCalculator {
    pricer: Pricer,
    bumps: GreeksBumps,
}

impl GreeksCalculator {
    /// Calculator with default bumps.
    pub fn new(pricer: Pricer) -> Self {
        Self {
            pricer,
            bumps: GreeksBumps::default(),
        }
    }

    /// Calculator with explicit bumps.
    pub fn with_bumps(pricer: Pricer, bumps: GreeksBumps) -> Result<Self, PricingError> {
        bumps.validate()?;
        Ok(Self { pricer, bumps })
    }

    /// Bump sizes.
    pub fn bumps(&self) -> &GreeksBumps {
        &self.bumps
    }

    /// Underlying pricer.
    pub fn pricer(&self) -> &Pricer {
        &self.pricer
    }

    /// Price and Greeks of `instrument`, with `model` overriding the
    /// selector.
    pub fn calculate(
        &self,
        instrument: &Instrument,
        snapshot: &MarketSnapshot,
        model: Option<ModelType>,
    ) -> Result<GreeksResult, PricingError> {
        let model = model.unwrap_or_else(|| select_model(instrument));
        let base = self.pricer.price(instrument, snapshot, model)?;
        let primary = instrument
            .underlyings()
            .first()
            .copied()
            .ok_or_else(|| PricingError::InvalidInput("instrument has no underlying".to_string()))?;
        let quote = snapshot.quote(primary)?;
        let expiry = instrument.time_to_expiry(snapshot.as_of);

        let mut result = GreeksResult {
            price: base.value,
            spot: quote.spot,
            std_error: base.diagnostics.std_error,
            model,
            warnings: base.warnings,
            ..GreeksResult::default()
        };
        if expiry <= EXPIRY_EPSILON {
            return Ok(result);
        }

        let notional = instrument.notional();
        let rate = snapshot.risk_free_rate;
        let analytic = match (model, instrument) {
            (ModelType::ClosedForm, Instrument::Option(option)) => {
                let bs = BlackScholes::new(quote.spot, rate, quote.dividend_yield, quote.volatility)?;
                Some(bs.greeks(option.strike, expiry, option.option_type))
            }
            (ModelType::ClosedForm, Instrument::Future(future)) => Some(future_greeks(
                quote.spot,
                future.contract_price,
                rate,
                quote.dividend_yield,
                expiry,
            )),
            _ => None,
        };

        match analytic {
            Some(greeks) => apply_analytic(&mut result, &greeks, notional),
            None => self.finite_difference(&mut result, instrument, snapshot, model, quote.volatility)?,
        }

        debug!(
            instrument = instrument.instrument_id(),
            model = %model,
            delta = result.delta,
            gamma = result.gamma,
            vega = result.vega,
            "computed Greeks"
        );
        Ok(result)
    }

    fn finite_difference(
        &self,
        result: &mut GreeksResult,
        instrument: &Instrument,
        snapshot: &MarketSnapshot,
        model: ModelType,
        volatility: f64,
    ) -> Result<(), PricingError> {
        let value = |snap: &MarketSnapshot| -> Result<f64, PricingError> {
            Ok(self.pricer.price(instrument, snap, model)?.value)
        };
        let b = &self.bumps;
        let v0 = result.price;

        // baskets: every underlying moves by spot_pct, measured in primary spot units
        let ds = result.spot * b.spot_pct;
        let up = snapshot.with_spot_shift(b.spot_pct);
        let down = snapshot.with_spot_shift(-b.spot_pct);
        let v_up = value(&up)?;
        let v_down = value(&down)?;
        result.delta = (v_up - v_down) / (2.0 * ds);
        result.gamma = (v_up - 2.0 * v0 + v_down) / (ds * ds);

        let dv = b.vol_abs;
        let v_vol_up = value(&snapshot.with_vol_shift(dv))?;
        if volatility > dv {
            let v_vol_down = value(&snapshot.with_vol_shift(-dv))?;
            result.vega = (v_vol_up - v_vol_down) / (2.0 * dv);
            result.volga = Some((v_vol_up - 2.0 * v0 + v_vol_down) / (dv * dv));

            let uu = value(&up.with_vol_shift(dv))?;
            let ud = value(&up.with_vol_shift(-dv))?;
            let du = value(&down.with_vol_shift(dv))?;
            let dd = value(&down.with_vol_shift(-dv))?;
            result.vanna = Some((uu - ud - du + dd) / (4.0 * ds * dv));
        } else {
            result.vega = (v_vol_up - v0) / dv;
        }

        let dr = b.rate_abs;
        let v_rate_up = value(&snapshot.with_rate_shift(dr))?;
        let v_rate_down = value(&snapshot.with_rate_shift(-dr))?;
        result.rho = (v_rate_up - v_rate_down) / (2.0 * dr);

        let dt = b.time_days as f64 / 365.0;
        let v_later = value(&snapshot.with_date_shift(b.time_days))?;
        result.theta = (v_later - v0) / dt;
        Ok(())
    }
}

fn apply_analytic(result: &mut GreeksResult, greeks: &AnalyticGreeks, notional: f64) {
    result.delta = greeks.delta * notional;
    result.gamma = greeks.gamma * notional;
    result.theta = greeks.theta * notional;
    result.vega = greeks.vega * notional;
    result.rho = greeks.rho * notional;
    result.vanna = Some(greeks.vanna * notional);
    result.volga = Some(greeks.volga * notional);
    result.charm = Some(greeks.charm * notional);
    result.color = Some(greeks.color * notional);
}
