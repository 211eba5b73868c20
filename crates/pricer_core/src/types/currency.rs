//! ISO 4217 currency codes for instrument notionals.
//!
//! ```
//! use pricer_core::types::currency::Currency;
//!
//! assert_eq!(Currency::USD.code(), "USD");
//! assert_eq!(Currency::HKD.to_string(), "HKD");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Settlement currencies supported by the engine.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    /// United States Dollar
    #[default]
    USD,
    /// Euro
    EUR,
    /// British Pound Sterling
    GBP,
    /// Japanese Yen
    JPY,
    /// Swiss Franc
    CHF,
    /// Hong Kong Dollar
    HKD,
    /// Australian Dollar
    AUD,
    /// Canadian Dollar
    CAD,
}

impl Currency {
    /// Returns the ISO 4217 three-letter code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CHF => "CHF",
            Currency::HKD => "HKD",
            Currency::AUD => "AUD",
            Currency::CAD => "CAD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_code() {
        assert_eq!(Currency::JPY.to_string(), "JPY");
        assert_eq!(Currency::default(), Currency::USD);
    }

    #[test]
    fn test_serde_as_code() {
        let json = serde_json::to_string(&Currency::EUR).unwrap();
        assert_eq!(json, "\"EUR\"");
        let back: Currency = serde_json::from_str("\"CHF\"").unwrap();
        assert_eq!(back, Currency::CHF);
    }
}
