//! Fields shared by every instrument.

use pricer_core::types::{time_to_maturity_dates, Currency, Date};
use serde::{Deserialize, Serialize};

use super::error::InstrumentError;

/// Common instrument terms: identifier, currency, dates, and notional.
///
/// # Examples
/// ```
/// use pricer_models::instruments::InstrumentTerms;
/// use pricer_core::types::{Currency, Date};
///
/// let terms = InstrumentTerms::new(
///     "OPT-1",
///     Currency::USD,
///     Date::from_ymd(2024, 1, 1).unwrap(),
///     Date::from_ymd(2025, 1, 1).unwrap(),
///     1.0,
/// );
/// assert!(terms.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentTerms {
    /// Canonical instrument identifier.
    pub instrument_id: String,
    /// Settlement currency.
    #[serde(default)]
    pub currency: Currency,
    /// Issue (or trade) date.
    pub issue_date: Date,
    /// Expiry or maturity date.
    pub expiry_date: Date,
    /// Notional amount (number of units for options and futures).
    pub notional: f64,
}

impl InstrumentTerms {
    /// Creates terms without validation.
    pub fn new(
        instrument_id: impl Into<String>,
        currency: Currency,
        issue_date: Date,
        expiry_date: Date,
        notional: f64,
    ) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            currency,
            issue_date,
            expiry_date,
            notional,
        }
    }

    /// Checks that expiry follows issue and the notional is positive.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        if self.instrument_id.trim().is_empty() {
            return Err(InstrumentError::InvalidParameter {
                message: "instrument_id must not be empty".to_string(),
            });
        }
        if self.expiry_date <= self.issue_date {
            return Err(InstrumentError::InvalidDates {
                issue: self.issue_date,
                expiry: self.expiry_date,
            });
        }
        if !(self.notional.is_finite() && self.notional > 0.0) {
            return Err(InstrumentError::InvalidNotional {
                notional: self.notional,
            });
        }
        Ok(())
    }

    /// Years from `as_of` to expiry (ACT/365); negative once expired.
    #[inline]
    pub fn time_to_expiry(&self, as_of: Date) -> f64 {
        time_to_maturity_dates(as_of, self.expiry_date)
    }
}
