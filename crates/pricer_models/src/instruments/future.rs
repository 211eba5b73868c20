//! Futures contracts.

use serde::{Deserialize, Serialize};

use super::error::InstrumentError;
use super::params::InstrumentTerms;

/// Long futures position on a single underlying, struck at the traded price.
///
/// Value per unit is `S·e^(−qT) − K·e^(−rT)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Future {
    /// Common terms.
    pub terms: InstrumentTerms,
    /// Underlying symbol.
    pub underlying: String,
    /// Contract (traded) price.
    pub contract_price: f64,
}

impl Future {
    /// Builds and validates a future.
    pub fn new(
        terms: InstrumentTerms,
        underlying: impl Into<String>,
        contract_price: f64,
    ) -> Result<Self, InstrumentError> {
        let future = Self {
            terms,
            underlying: underlying.into(),
            contract_price,
        };
        future.validate()?;
        Ok(future)
    }

    /// Checks terms and contract price.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        self.terms.validate()?;
        if !(self.contract_price.is_finite() && self.contract_price > 0.0) {
            return Err(InstrumentError::InvalidStrike {
                strike: self.contract_price,
            });
        }
        Ok(())
    }
}
