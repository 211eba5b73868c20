//! Point-in-time market data consumed by the pricing engines.
//!
//! A [`MarketSnapshot`] holds one [`UnderlyingQuote`] per symbol together
//! with the risk-free rate and pairwise correlations. Snapshots are
//! immutable inputs; shocked copies are produced with the `with_*` methods.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::math::correlation::CorrelationMatrix;
use crate::types::{Date, PricingError};

/// One point of an implied volatility term structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolPoint {
    /// Tenor in years.
    pub tenor: f64,
    /// Implied volatility at that tenor.
    pub volatility: f64,
}

/// Market state for a single underlying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingQuote {
    /// Ticker or identifier of the underlying.
    pub symbol: String,
    /// Current spot price.
    pub spot: f64,
    /// Implied (or historical) volatility used for pricing.
    pub volatility: f64,
    /// Continuous dividend yield.
    #[serde(default)]
    pub dividend_yield: f64,
    /// Trailing implied volatility observations, oldest first.
    #[serde(default)]
    pub iv_history: Vec<f64>,
    /// Quoted implied volatility term structure.
    #[serde(default)]
    pub term_structure: Vec<VolPoint>,
}

impl UnderlyingQuote {
    /// Quote with zero dividend yield and no history.
    pub fn new(symbol: impl Into<String>, spot: f64, volatility: f64) -> Self {
        Self {
            symbol: symbol.into(),
            spot,
            volatility,
            dividend_yield: 0.0,
            iv_history: Vec::new(),
            term_structure: Vec::new(),
        }
    }

    /// Sets the dividend yield.
    pub fn with_dividend_yield(mut self, q: f64) -> Self {
        self.dividend_yield = q;
        self
    }

    /// Sets the implied volatility history.
    pub fn with_iv_history(mut self, history: Vec<f64>) -> Self {
        self.iv_history = history;
        self
    }

    /// Sets the quoted term structure.
    pub fn with_term_structure(mut self, points: Vec<VolPoint>) -> Self {
        self.term_structure = points;
        self
    }
}

/// Pairwise correlation between two underlyings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationEntry {
    /// First symbol.
    pub first: String,
    /// Second symbol.
    pub second: String,
    /// Correlation coefficient.
    pub rho: f64,
}

/// Market snapshot for one or more underlyings.
///
/// # Examples
///
/// ```
/// use pricer_core::market_data::{MarketSnapshot, UnderlyingQuote};
/// use pricer_core::types::Date;
///
/// let snapshot = MarketSnapshot::new(Date::from_ymd(2024, 1, 2).unwrap(), 0.05)
///     .with_quote(UnderlyingQuote::new("SPX", 100.0, 0.2));
///
/// let shocked = snapshot.with_spot_shift(-0.1);
/// assert!((shocked.quote("SPX").unwrap().spot - 90.0).abs() < 1e-12);
/// assert!(snapshot.quote("NDX").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Valuation date.
    pub as_of: Date,
    /// Continuously compounded risk-free rate.
    pub risk_free_rate: f64,
    /// Quotes keyed by symbol.
    #[serde(default)]
    pub quotes: BTreeMap<String, UnderlyingQuote>,
    /// Pairwise correlations; missing pairs are treated as uncorrelated.
    #[serde(default)]
    pub correlations: Vec<CorrelationEntry>,
}

impl MarketSnapshot {
    /// Empty snapshot at `as_of` with the given rate.
    pub fn new(as_of: Date, risk_free_rate: f64) -> Self {
        Self {
            as_of,
            risk_free_rate,
            quotes: BTreeMap::new(),
            correlations: Vec::new(),
        }
    }

    /// Adds or replaces a quote.
    pub fn with_quote(mut self, quote: UnderlyingQuote) -> Self {
        self.quotes.insert(quote.symbol.clone(), quote);
        self
    }

    /// Adds a symmetric correlation between two symbols.
    pub fn with_correlation(
        mut self,
        first: impl Into<String>,
        second: impl Into<String>,
        rho: f64,
    ) -> Self {
        self.correlations.push(CorrelationEntry {
            first: first.into(),
            second: second.into(),
            rho,
        });
        self
    }

    /// Looks up the quote for `symbol`.
    pub fn quote(&self, symbol: &str) -> Result<&UnderlyingQuote, PricingError> {
        self.quotes
            .get(symbol)
            .ok_or_else(|| PricingError::MarketDataUnavailable(symbol.to_string()))
    }

    /// Mutable access to the quote for `symbol`.
    pub fn quote_mut(&mut self, symbol: &str) -> Result<&mut UnderlyingQuote, PricingError> {
        self.quotes
            .get_mut(symbol)
            .ok_or_else(|| PricingError::MarketDataUnavailable(symbol.to_string()))
    }

    /// Correlation between two symbols; 1 on the diagonal, 0 when unknown.
    pub fn correlation(&self, first: &str, second: &str) -> f64 {
        if first == second {
            return 1.0;
        }
        self.correlations
            .iter()
            .find(|c| {
                (c.first == first && c.second == second) || (c.first == second && c.second == first)
            })
            .map(|c| c.rho)
            .unwrap_or(0.0)
    }

    /// Validated correlation matrix for `symbols`, in the given order.
    pub fn correlation_matrix(&self, symbols: &[&str]) -> Result<CorrelationMatrix, PricingError> {
        let n = symbols.len();
        let mut data = Vec::with_capacity(n * n);
        for a in symbols {
            for b in symbols {
                data.push(self.correlation(a, b));
            }
        }
        Ok(CorrelationMatrix::new(&data, n)?)
    }

    /// Copy with every spot multiplied by `1 + pct`.
    pub fn with_spot_shift(&self, pct: f64) -> Self {
        let mut out = self.clone();
        for quote in out.quotes.values_mut() {
            quote.spot *= 1.0 + pct;
        }
        out
    }

    /// Copy with `shift` added to every volatility.
    ///
    /// Results are not floored; callers decide how to treat non-positive
    /// volatility.
    pub fn with_vol_shift(&self, shift: f64) -> Self {
        let mut out = self.clone();
        for quote in out.quotes.values_mut() {
            quote.volatility += shift;
        }
        out
    }

    /// Copy with `shift` added to the risk-free rate.
    pub fn with_rate_shift(&self, shift: f64) -> Self {
        let mut out = self.clone();
        out.risk_free_rate += shift;
        out
    }

    /// Copy with the valuation date moved by `days`.
    pub fn with_date_shift(&self, days: i64) -> Self {
        let mut out = self.clone();
        out.as_of = self.as_of.add_days(days);
        out
    }

    /// Non-fatal observations about the snapshot.
    ///
    /// Non-positive volatility, negative rates and negative dividends are
    /// legitimate states; they are reported, not rejected.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.risk_free_rate < 0.0 {
            warnings.push(format!("negative risk-free rate {}", self.risk_free_rate));
        }
        for quote in self.quotes.values() {
            if quote.volatility <= 0.0 {
                warnings.push(format!(
                    "non-positive volatility {} for {}",
                    quote.volatility, quote.symbol
                ));
            }
            if quote.dividend_yield < 0.0 {
                warnings.push(format!(
                    "negative dividend yield {} for {}",
                    quote.dividend_yield, quote.symbol
                ));
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot::new(Date::from_ymd(2024, 1, 2).unwrap(), 0.03)
            .with_quote(UnderlyingQuote::new("AAA", 100.0, 0.2))
            .with_quote(UnderlyingQuote::new("BBB", 50.0, 0.3).with_dividend_yield(0.01))
            .with_correlation("AAA", "BBB", 0.4)
    }

    #[test]
    fn test_missing_quote_is_market_data_unavailable() {
        assert_eq!(
            snapshot().quote("CCC"),
            Err(PricingError::MarketDataUnavailable("CCC".to_string()))
        );
    }

    #[test]
    fn test_correlation_lookup_is_symmetric() {
        let s = snapshot();
        assert_eq!(s.correlation("BBB", "AAA"), 0.4);
        assert_eq!(s.correlation("AAA", "AAA"), 1.0);
        assert_eq!(s.correlation("AAA", "ZZZ"), 0.0);

        let m = s.correlation_matrix(&["BBB", "AAA"]).unwrap();
        assert_eq!(m.get(0, 1), 0.4);
    }

    #[test]
    fn test_shocks_do_not_mutate_base() {
        let base = snapshot();
        let shocked = base.with_spot_shift(0.2).with_vol_shift(-0.05).with_rate_shift(0.01);
        assert_relative_eq!(shocked.quote("AAA").unwrap().spot, 120.0, epsilon = 1e-12);
        assert_relative_eq!(shocked.quote("BBB").unwrap().volatility, 0.25, epsilon = 1e-12);
        assert_relative_eq!(shocked.risk_free_rate, 0.04, epsilon = 1e-12);
        assert_eq!(base.quote("AAA").unwrap().spot, 100.0);
    }

    #[test]
    fn test_warnings_for_unusual_states() {
        let s = snapshot().with_rate_shift(-0.05).with_vol_shift(-0.25);
        let warnings = s.warnings();
        assert!(warnings.iter().any(|w| w.contains("negative risk-free rate")));
        assert!(warnings.iter().any(|w| w.contains("non-positive volatility")));
        assert!(snapshot().warnings().is_empty());
    }

    #[test]
    fn test_json_roundtrip() {
        let s = snapshot();
        let json = serde_json::to_string(&s).unwrap();
        let back: MarketSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
