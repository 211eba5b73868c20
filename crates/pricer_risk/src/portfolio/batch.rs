//! Batch portfolio valuation.

use pricer_core::market_data::MarketSnapshot;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Portfolio, PortfolioId};
use crate::orchestrator::{ValuationEngine, ValuationOptions, ValuationResult};

/// Outcome for one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionValuation {
    /// Instrument identifier.
    pub instrument_id: String,
    /// Units held.
    pub quantity: f64,
    /// `quantity × value`; `None` when valuation failed.
    pub position_value: Option<f64>,
    /// Full valuation, when it succeeded.
    pub result: Option<ValuationResult>,
    /// Error message, when it failed.
    pub error: Option<String>,
}

impl PositionValuation {
    /// Whether valuation succeeded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome for a whole portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValuation {
    /// Portfolio identifier.
    pub portfolio_id: PortfolioId,
    /// Sum of successful position values.
    pub total_value: f64,
    /// Rows in portfolio order.
    pub positions: Vec<PositionValuation>,
    /// Number of failed positions.
    pub failures: usize,
    /// Wall-clock time of the batch.
    pub calculation_time_ms: f64,
}

impl ValuationEngine {
    /// Values every position in parallel, capturing errors per position.
    pub fn valuate_portfolio(
        &self,
        portfolio: &Portfolio,
        snapshot: &MarketSnapshot,
        options: &ValuationOptions,
    ) -> PortfolioValuation {
        let start = std::time::Instant::now();
        let positions: Vec<PositionValuation> = self.install(|| {
            portfolio
                .positions()
                .par_iter()
                .map(|p| {
                    let id = p.instrument.instrument_id().to_string();
                    match self.valuate(&p.instrument, snapshot, options) {
                        Ok(result) => PositionValuation {
                            instrument_id: id,
                            quantity: p.quantity,
                            position_value: Some(result.value * p.quantity),
                            result: Some(result),
                            error: None,
                        },
                        Err(e) => {
                            warn!(portfolio = %portfolio.id(), instrument = %id, error = %e, "position valuation failed");
                            PositionValuation {
                                instrument_id: id,
                                quantity: p.quantity,
                                position_value: None,
                                result: None,
                                error: Some(e.to_string()),
                            }
                        }
                    }
                })
                .collect()
        });

        let total_value = positions.iter().filter_map(|p| p.position_value).sum();
        let failures = positions.iter().filter(|p| !p.is_ok()).count();
        debug!(portfolio = %portfolio.id(), positions = positions.len(), failures, total_value, "portfolio valued");
        PortfolioValuation {
            portfolio_id: portfolio.id().clone(),
            total_value,
            positions,
            failures,
            calculation_time_ms: start.elapsed().as_secs_f64() * 1_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::portfolio::PortfolioBuilder;
    use approx::assert_relative_eq;
    use pricer_core::market_data::UnderlyingQuote;
    use pricer_core::types::{Currency, Date};
    use pricer_models::instruments::{EquityOption, ExerciseStyle, Future, Instrument, InstrumentTerms, OptionType};

    fn terms(id: &str) -> InstrumentTerms {
        InstrumentTerms::new(
            id,
            Currency::USD,
            Date::from_ymd(2024, 1, 2).unwrap(),
            Date::from_ymd(2025, 1, 2).unwrap(),
            1.0,
        )
    }

    #[test]
    fn test_batch_captures_failures_and_totals_the_rest() {
        let call: Instrument = EquityOption::new(terms("C"), "ACME", 100.0, OptionType::Call, ExerciseStyle::European)
            .unwrap()
            .into();
        let put: Instrument = EquityOption::new(terms("P"), "ACME", 100.0, OptionType::Put, ExerciseStyle::European)
            .unwrap()
            .into();
        let orphan: Instrument = Future::new(terms("F"), "MISSING", 100.0).unwrap().into();
        let portfolio = PortfolioBuilder::new("BOOK")
            .add_position(call, 2.0)
            .add_position(put, -1.0)
            .add_position(orphan, 1.0)
            .build()
            .unwrap();
        let snapshot = MarketSnapshot::new(Date::from_ymd(2024, 1, 2).unwrap(), 0.05)
            .with_quote(UnderlyingQuote::new("ACME", 100.0, 0.2));

        let mut config = EngineConfig::default();
        config.parallel.worker_threads = 2;
        let engine = ValuationEngine::new(config).unwrap();
        let batch = engine.valuate_portfolio(&portfolio, &snapshot, &ValuationOptions::default());

        assert_eq!(batch.positions.len(), 3);
        assert_eq!(batch.failures, 1);
        assert!(batch.positions[2].error.as_ref().unwrap().contains("MISSING"));
        let c = batch.positions[0].result.as_ref().unwrap().value;
        let p = batch.positions[1].result.as_ref().unwrap().value;
        assert_relative_eq!(batch.total_value, 2.0 * c - p, epsilon = 1e-9);
    }
}
