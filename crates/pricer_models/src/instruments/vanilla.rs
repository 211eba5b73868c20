//! Single-name equity options.

use serde::{Deserialize, Serialize};

use super::error::InstrumentError;
use super::exercise::ExerciseStyle;
use super::params::InstrumentTerms;
use super::payoff::OptionType;

/// Call or put on a single underlying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityOption {
    /// Common terms.
    pub terms: InstrumentTerms,
    /// Underlying symbol.
    pub underlying: String,
    /// Strike price.
    pub strike: f64,
    /// Call or put.
    pub option_type: OptionType,
    /// Exercise style.
    #[serde(default)]
    pub exercise: ExerciseStyle,
}

impl EquityOption {
    /// Builds and validates an option.
    pub fn new(
        terms: InstrumentTerms,
        underlying: impl Into<String>,
        strike: f64,
        option_type: OptionType,
        exercise: ExerciseStyle,
    ) -> Result<Self, InstrumentError> {
        let option = Self {
            terms,
            underlying: underlying.into(),
            strike,
            option_type,
            exercise,
        };
        option.validate()?;
        Ok(option)
    }

    /// Checks terms, strike and Bermudan dates.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        self.terms.validate()?;
        if !(self.strike.is_finite() && self.strike > 0.0) {
            return Err(InstrumentError::InvalidStrike {
                strike: self.strike,
            });
        }
        if let ExerciseStyle::Bermudan { exercise_dates } = &self.exercise {
            if let Some(bad) = exercise_dates
                .iter()
                .find(|d| **d > self.terms.expiry_date)
            {
                return Err(InstrumentError::InvalidParameter {
                    message: format!("Bermudan exercise date {} after expiry", bad),
                });
            }
        }
        Ok(())
    }

    /// Exercise value per unit at spot `s`.
    #[inline]
    pub fn payoff(&self, s: f64) -> f64 {
        self.option_type.intrinsic(s, self.strike)
    }
}
