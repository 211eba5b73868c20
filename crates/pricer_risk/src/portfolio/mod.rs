//! Portfolios and batch valuation.
//!
//! A [`Portfolio`] is a list of signed positions; [`ValuationEngine::valuate_portfolio`](crate::orchestrator::ValuationEngine::valuate_portfolio)
//! values each one independently and in parallel. A failing position is
//! reported in its row and excluded from the total; it does not abort the
//! batch.

mod batch;
mod error;
mod ids;

pub use batch::{PortfolioValuation, PositionValuation};
pub use error::PortfolioError;
pub use ids::PortfolioId;

use std::collections::HashSet;

use pricer_models::instruments::Instrument;
use serde::{Deserialize, Serialize};

/// A signed holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Instrument held.
    pub instrument: Instrument,
    /// Units held; negative for short positions.
    pub quantity: f64,
}

impl Position {
    /// Creates a position.
    pub fn new(instrument: Instrument, quantity: f64) -> Self {
        Self { instrument, quantity }
    }
}

/// Named collection of positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    id: PortfolioId,
    positions: Vec<Position>,
}

impl Portfolio {
    /// Portfolio identifier.
    pub fn id(&self) -> &PortfolioId {
        &self.id
    }

    /// Positions in insertion order.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the portfolio holds nothing.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Instruments carrying at least one barrier.
    pub fn barrier_instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.positions
            .iter()
            .map(|p| &p.instrument)
            .filter(|i| !i.barriers().is_empty())
    }
}

/// Builder for [`Portfolio`].
///
/// # Examples
///
/// ```
/// use pricer_core::types::{Currency, Date};
/// use pricer_models::instruments::{Future, InstrumentTerms};
/// use pricer_risk::portfolio::PortfolioBuilder;
///
/// let terms = InstrumentTerms::new(
///     "FUT-1",
///     Currency::USD,
///     Date::from_ymd(2024, 1, 2).unwrap(),
///     Date::from_ymd(2024, 6, 21).unwrap(),
///     50.0,
/// );
/// let portfolio = PortfolioBuilder::new("BOOK")
///     .add_position(Future::new(terms, "SPX", 4800.0).unwrap().into(), -2.0)
///     .build()
///     .unwrap();
/// assert_eq!(portfolio.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PortfolioBuilder {
    id: PortfolioId,
    positions: Vec<Position>,
}

impl PortfolioBuilder {
    /// Starts a portfolio.
    pub fn new(id: impl Into<PortfolioId>) -> Self {
        Self {
            id: id.into(),
            positions: Vec::new(),
        }
    }

    /// Adds a position.
    pub fn add_position(mut self, instrument: Instrument, quantity: f64) -> Self {
        self.positions.push(Position::new(instrument, quantity));
        self
    }

    /// Adds several positions.
    pub fn add_positions(mut self, positions: impl IntoIterator<Item = Position>) -> Self {
        self.positions.extend(positions);
        self
    }

    /// Validates and builds.
    pub fn build(self) -> Result<Portfolio, PortfolioError> {
        if self.positions.is_empty() {
            return Err(PortfolioError::EmptyPortfolio);
        }
        let mut seen = HashSet::new();
        for p in &self.positions {
            let id = p.instrument.instrument_id();
            if !seen.insert(id) {
                return Err(PortfolioError::DuplicatePosition(id.to_string()));
            }
            if !p.quantity.is_finite() {
                return Err(PortfolioError::InvalidQuantity {
                    instrument_id: id.to_string(),
                    quantity: p.quantity,
                });
            }
        }
        Ok(Portfolio {
            id: self.id,
            positions: self.positions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::types::{Currency, Date};
    use pricer_models::instruments::{Future, InstrumentTerms};

    fn future(id: &str) -> Instrument {
        let terms = InstrumentTerms::new(
            id,
            Currency::USD,
            Date::from_ymd(2024, 1, 2).unwrap(),
            Date::from_ymd(2024, 12, 20).unwrap(),
            1.0,
        );
        Future::new(terms, "ACME", 100.0).unwrap().into()
    }

    #[test]
    fn test_builder_rejects_empty_and_duplicates() {
        assert_eq!(PortfolioBuilder::new("P").build().unwrap_err(), PortfolioError::EmptyPortfolio);
        let err = PortfolioBuilder::new("P")
            .add_position(future("F1"), 1.0)
            .add_position(future("F1"), 2.0)
            .build()
            .unwrap_err();
        assert_eq!(err, PortfolioError::DuplicatePosition("F1".to_string()));
        assert!(PortfolioBuilder::new("P")
            .add_position(future("F1"), f64::NAN)
            .build()
            .is_err());
    }

    #[test]
    fn test_barrier_instruments_filter() {
        let portfolio = PortfolioBuilder::new("P")
            .add_position(future("F1"), 1.0)
            .build()
            .unwrap();
        assert_eq!(portfolio.barrier_instruments().count(), 0);
        assert_eq!(portfolio.id().as_str(), "P");
    }
}
