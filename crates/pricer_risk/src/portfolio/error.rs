//! Portfolio error types.

use pricer_core::types::PricingError;
use thiserror::Error;

/// Errors that can occur while assembling a portfolio.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PortfolioError {
    /// Two positions reference the same instrument.
    #[error("Duplicate position for instrument: {0}")]
    DuplicatePosition(String),

    /// Position quantity is not a finite number.
    #[error("Invalid quantity {quantity} for instrument {instrument_id}")]
    InvalidQuantity {
        /// Instrument identifier
        instrument_id: String,
        /// Offending quantity
        quantity: f64,
    },

    /// Empty portfolio (no positions).
    #[error("Portfolio is empty")]
    EmptyPortfolio,
}

impl From<PortfolioError> for PricingError {
    fn from(err: PortfolioError) -> Self {
        PricingError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_conversion() {
        let err = PortfolioError::DuplicatePosition("OPT-1".to_string());
        assert_eq!(err.to_string(), "Duplicate position for instrument: OPT-1");
        let pricing: PricingError = err.into();
        assert!(pricing.is_input_error());
    }
}
