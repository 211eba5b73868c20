//! Instrument error types.

use pricer_core::types::{Date, PricingError};
use thiserror::Error;

/// Instrument validation errors.
///
/// Raised before any model runs; each converts into
/// [`PricingError::InvalidInput`].
///
/// # Examples
/// ```
/// use pricer_models::instruments::InstrumentError;
///
/// let err = InstrumentError::InvalidStrike { strike: -100.0 };
/// assert!(format!("{}", err).contains("-100"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstrumentError {
    /// Strike is non-positive or not finite.
    #[error("Invalid strike: K = {strike}")]
    InvalidStrike {
        /// The invalid strike value
        strike: f64,
    },

    /// Expiry is not strictly after issue.
    #[error("Invalid dates: expiry {expiry} is not after issue {issue}")]
    InvalidDates {
        /// Issue date
        issue: Date,
        /// Expiry date
        expiry: Date,
    },

    /// Notional is non-positive or not finite.
    #[error("Invalid notional: N = {notional}")]
    InvalidNotional {
        /// The invalid notional value
        notional: f64,
    },

    /// Basket weights are negative or do not sum to 100.
    #[error("Invalid basket weights: sum = {sum}")]
    InvalidWeights {
        /// Sum of the supplied weights
        sum: f64,
    },

    /// Barrier references an unknown underlying or has a bad level.
    #[error("Invalid barrier {id}: {message}")]
    InvalidBarrier {
        /// Barrier identifier
        id: String,
        /// What is wrong with it
        message: String,
    },

    /// Invalid payoff parameters.
    #[error("Invalid payoff parameters: {message}")]
    InvalidPayoff {
        /// Description of the problem
        message: String,
    },

    /// Invalid parameter (general validation failure).
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the parameter error
        message: String,
    },
}

impl From<InstrumentError> for PricingError {
    fn from(err: InstrumentError) -> Self {
        PricingError::InvalidInput(err.to_string())
    }
}
