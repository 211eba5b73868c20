//! Model selection policy.
//!
//! [`select_model`] is total over [`Instrument`]: every shape maps to exactly
//! one engine. [`ensure_supported`] rejects explicit model overrides an
//! engine cannot honour.

use std::fmt;

use pricer_core::types::PricingError;
use pricer_models::instruments::{BarrierEffect, Instrument, StructuredProduct};
use serde::{Deserialize, Serialize};

/// Pricing engine family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    /// Analytic Black–Scholes family.
    ClosedForm,
    /// Cox-Ross-Rubinstein lattice.
    Binomial,
    /// Path simulation.
    MonteCarlo,
}

impl ModelType {
    /// All engines.
    pub const ALL: [ModelType; 3] = [ModelType::ClosedForm, ModelType::Binomial, ModelType::MonteCarlo];

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            ModelType::ClosedForm => "closed-form",
            ModelType::Binomial => "binomial",
            ModelType::MonteCarlo => "monte-carlo",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Picks the engine for `instrument`.
///
/// - options: early exercise → Binomial, otherwise ClosedForm
/// - futures: ClosedForm
/// - structured products: active barrier or basket → MonteCarlo, call/put
///   schedule → Binomial, otherwise ClosedForm
///
/// # Examples
///
/// ```
/// use pricer_pricing::selector::{select_model, ModelType};
/// use pricer_models::instruments::{EquityOption, ExerciseStyle, Instrument, InstrumentTerms, OptionType};
/// use pricer_core::types::{Currency, Date};
///
/// let terms = InstrumentTerms::new(
///     "OPT-1", Currency::USD,
///     Date::from_ymd(2024, 1, 2).unwrap(), Date::from_ymd(2025, 1, 2).unwrap(), 1.0,
/// );
/// let option = EquityOption::new(terms, "ACME", 100.0, OptionType::Put, ExerciseStyle::American).unwrap();
/// assert_eq!(select_model(&Instrument::Option(option)), ModelType::Binomial);
/// ```
pub fn select_model(instrument: &Instrument) -> ModelType {
    match instrument {
        Instrument::Option(option) => {
            if option.exercise.has_early_exercise() {
                ModelType::Binomial
            } else {
                ModelType::ClosedForm
            }
        }
        Instrument::Future(_) => ModelType::ClosedForm,
        Instrument::StructuredProduct(product) => {
            if product.has_active_barrier() || product.is_basket() {
                ModelType::MonteCarlo
            } else if product.has_early_redemption_schedule() {
                ModelType::Binomial
            } else {
                ModelType::ClosedForm
            }
        }
    }
}

/// Checks that `model` can value `instrument`.
///
/// # Errors
///
/// [`PricingError::UnsupportedModel`] when the engine cannot represent a
/// feature of the instrument.
pub fn ensure_supported(model: ModelType, instrument: &Instrument) -> Result<(), PricingError> {
    let reject = |reason: &str| {
        Err(PricingError::UnsupportedModel {
            model: model.to_string(),
            reason: reason.to_string(),
        })
    };
    match (model, instrument) {
        (ModelType::ClosedForm, Instrument::Option(option)) if option.exercise.has_early_exercise() => {
            reject("closed form cannot value early exercise")
        }
        (ModelType::MonteCarlo, Instrument::Option(option)) if option.exercise.has_early_exercise() => {
            reject("Monte Carlo cannot value early exercise")
        }
        (ModelType::ClosedForm, Instrument::StructuredProduct(product)) => {
            if product.is_basket() {
                reject("closed form cannot value basket payoffs")
            } else if product.has_active_barrier() {
                reject("closed form cannot value path-dependent barriers")
            } else if product.has_early_redemption_schedule() {
                reject("closed form cannot value call or put schedules")
            } else {
                Ok(())
            }
        }
        (ModelType::Binomial, Instrument::StructuredProduct(product)) => {
            if product.is_basket() {
                reject("lattice is single-underlying")
            } else if has_path_memory(product) {
                reject("lattice cannot track knock-in, coupon or protection barriers")
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

/// Barriers whose effect depends on the path history rather than the node.
fn has_path_memory(product: &StructuredProduct) -> bool {
    product.has_active_barrier()
        && product.barriers.iter().any(|b| {
            matches!(
                b.barrier_type.effect(),
                BarrierEffect::KnockIn | BarrierEffect::Coupon | BarrierEffect::Protection
            )
        })
}
