//! Instrument definitions.
//!
//! [`Instrument`] is a closed tagged variant over options, futures and
//! structured products, so every engine matches on it exhaustively.
//!
//! # Examples
//!
//! ```
//! use pricer_models::instruments::{
//!     EquityOption, ExerciseStyle, Instrument, InstrumentTerms, OptionType,
//! };
//! use pricer_core::types::{Currency, Date};
//!
//! let terms = InstrumentTerms::new(
//!     "OPT-1",
//!     Currency::USD,
//!     Date::from_ymd(2024, 1, 2).unwrap(),
//!     Date::from_ymd(2025, 1, 2).unwrap(),
//!     10.0,
//! );
//! let option = EquityOption::new(terms, "ACME", 100.0, OptionType::Call, ExerciseStyle::American)
//!     .unwrap();
//! let instrument = Instrument::Option(option);
//!
//! assert_eq!(instrument.instrument_id(), "OPT-1");
//! assert_eq!(instrument.underlyings(), vec!["ACME"]);
//! assert!(instrument.validate().is_ok());
//! ```

mod barrier;
mod error;
mod exercise;
mod future;
mod params;
mod payoff;
mod structured;
mod vanilla;

pub use barrier::{
    BarrierDirection, BarrierEffect, BarrierFeature, BarrierHitState, BarrierId,
    BarrierObservation, BarrierType, FRACTIONAL_LEVEL_LIMIT,
};
pub use error::InstrumentError;
pub use exercise::ExerciseStyle;
pub use future::Future;
pub use params::InstrumentTerms;
pub use payoff::{OptionType, PayoffParams};
pub use structured::{
    ScheduledAmount, StructuredProduct, UnderlyingAsset, WEIGHT_SUM_TOLERANCE,
};
pub use vanilla::EquityOption;

use pricer_core::types::Date;
use serde::{Deserialize, Serialize};

/// Any instrument the engine can value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Instrument {
    /// Call or put on a single underlying.
    Option(EquityOption),
    /// Futures contract.
    Future(Future),
    /// Structured note.
    StructuredProduct(StructuredProduct),
}

impl Instrument {
    /// Common terms.
    #[inline]
    pub fn terms(&self) -> &InstrumentTerms {
        match self {
            Instrument::Option(o) => &o.terms,
            Instrument::Future(f) => &f.terms,
            Instrument::StructuredProduct(p) => &p.terms,
        }
    }

    /// Canonical identifier.
    #[inline]
    pub fn instrument_id(&self) -> &str {
        &self.terms().instrument_id
    }

    /// Variant name.
    pub fn kind(&self) -> &'static str {
        match self {
            Instrument::Option(_) => "Option",
            Instrument::Future(_) => "Future",
            Instrument::StructuredProduct(_) => "StructuredProduct",
        }
    }

    /// Underlying symbols in declaration order.
    pub fn underlyings(&self) -> Vec<&str> {
        match self {
            Instrument::Option(o) => vec![o.underlying.as_str()],
            Instrument::Future(f) => vec![f.underlying.as_str()],
            Instrument::StructuredProduct(p) => {
                p.underlyings.iter().map(|a| a.symbol.as_str()).collect()
            }
        }
    }

    /// Years from `as_of` to expiry; negative once expired.
    #[inline]
    pub fn time_to_expiry(&self, as_of: Date) -> f64 {
        self.terms().time_to_expiry(as_of)
    }

    /// Notional amount.
    #[inline]
    pub fn notional(&self) -> f64 {
        self.terms().notional
    }

    /// Validates the full instrument.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        match self {
            Instrument::Option(o) => o.validate(),
            Instrument::Future(f) => f.validate(),
            Instrument::StructuredProduct(p) => p.validate(),
        }
    }

    /// Barrier features; empty for options and futures.
    pub fn barriers(&self) -> &[BarrierFeature] {
        match self {
            Instrument::StructuredProduct(p) => &p.barriers,
            _ => &[],
        }
    }

    /// Mutable barrier features; empty for options and futures.
    pub fn barriers_mut(&mut self) -> &mut [BarrierFeature] {
        match self {
            Instrument::StructuredProduct(p) => &mut p.barriers,
            _ => &mut [],
        }
    }
}

impl From<EquityOption> for Instrument {
    fn from(option: EquityOption) -> Self {
        Instrument::Option(option)
    }
}

impl From<Future> for Instrument {
    fn from(future: Future) -> Self {
        Instrument::Future(future)
    }
}

impl From<StructuredProduct> for Instrument {
    fn from(product: StructuredProduct) -> Self {
        Instrument::StructuredProduct(product)
    }
}
