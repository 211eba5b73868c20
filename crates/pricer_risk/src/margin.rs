//! SPAN-style scenario margin.
//!
//! The portfolio is revalued under a scan of price and volatility moves;
//! the SPAN requirement is the largest weighted portfolio loss across the
//! scan. The standard scan has sixteen scenarios: seven price moves
//! (0, ±1/3, ±2/3, ±1 of the price scan range) each with volatility up
//! and down, plus two extreme moves of three times the range counted at
//! 35%.

use pricer_core::market_data::MarketSnapshot;
use pricer_core::types::PricingError;
use pricer_models::instruments::Instrument;
use pricer_pricing::pricer::Pricer;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MarginSection;
use crate::scenario::MarketShock;

/// Share of the extreme-move loss that counts towards margin.
pub const EXTREME_MOVE_WEIGHT: f64 = 0.35;

/// Multiple of the price scan range used for extreme moves.
pub const EXTREME_MOVE_MULTIPLE: f64 = 3.0;

/// One scan scenario with its loss weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpanScenario {
    /// Market shock.
    pub shock: MarketShock,
    /// Weight applied to the scenario P&L.
    pub weight: f64,
}

/// Sixteen-scenario price/volatility scan.
pub fn span_scenarios(price_scan: f64, vol_scan: f64) -> Vec<SpanScenario> {
    let mut scenarios = Vec::with_capacity(16);
    for fraction in [0.0, 1.0 / 3.0, -1.0 / 3.0, 2.0 / 3.0, -2.0 / 3.0, 1.0, -1.0] {
        for vol in [vol_scan, -vol_scan] {
            scenarios.push(SpanScenario {
                shock: MarketShock::new(fraction * price_scan, vol, 0.0),
                weight: 1.0,
            });
        }
    }
    for sign in [1.0, -1.0] {
        scenarios.push(SpanScenario {
            shock: MarketShock::new(sign * EXTREME_MOVE_MULTIPLE * price_scan, 0.0, 0.0),
            weight: EXTREME_MOVE_WEIGHT,
        });
    }
    scenarios
}

/// A signed holding of an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginPosition {
    /// Instrument held.
    pub instrument: Instrument,
    /// Units held; negative for short positions.
    pub quantity: f64,
}

impl MarginPosition {
    /// Creates a position.
    pub fn new(instrument: Instrument, quantity: f64) -> Self {
        Self { instrument, quantity }
    }
}

/// Margin attributed to one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionMargin {
    /// Instrument identifier.
    pub instrument_id: String,
    /// Units held.
    pub quantity: f64,
    /// Position value under the base snapshot.
    pub base_value: f64,
    /// Worst weighted loss of the position on its own.
    pub standalone_margin: f64,
    /// Position P&L in the portfolio's worst scenario.
    pub worst_scenario_pnl: f64,
}

/// Margin requirement of a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginCalculationResult {
    /// Initial margin.
    pub initial_margin: f64,
    /// Maintenance margin.
    pub maintenance_margin: f64,
    /// Largest weighted scan loss.
    pub span_margin: f64,
    /// Index of the scenario producing the SPAN loss.
    pub worst_scenario: Option<usize>,
    /// Scenarios evaluated.
    pub scenarios: Vec<SpanScenario>,
    /// Weighted portfolio P&L per scenario.
    pub scenario_pnls: Vec<f64>,
    /// Per-position breakdown.
    pub position_margins: Vec<PositionMargin>,
    /// Non-fatal conditions.
    pub warnings: Vec<String>,
    /// Wall-clock time of the scan.
    pub calculation_time_ms: f64,
}

/// Computes scan-based margin for a set of positions.
#[derive(Debug, Clone)]
pub struct MarginCalculator {
    pricer: Pricer,
    section: MarginSection,
}

impl MarginCalculator {
    /// Calculator with the given pricer and margin settings.
    pub fn new(pricer: Pricer, section: MarginSection) -> Self {
        Self { pricer, section }
    }

    /// Margin settings.
    pub fn section(&self) -> &MarginSection {
        &self.section
    }

    /// Standard scan from the configured ranges.
    pub fn standard_scenarios(&self) -> Vec<SpanScenario> {
        span_scenarios(self.section.price_scan, self.section.vol_scan)
    }

    /// Margin of `positions` under `snapshot`.
    ///
    /// `custom` replaces the standard scan; each custom shock has weight 1.
    pub fn calculate(
        &self,
        positions: &[MarginPosition],
        snapshot: &MarketSnapshot,
        custom: Option<&[MarketShock]>,
    ) -> Result<MarginCalculationResult, PricingError> {
        let start = std::time::Instant::now();
        if positions.is_empty() {
            return Err(PricingError::InvalidInput("margin request has no positions".to_string()));
        }
        if let Some(p) = positions.iter().find(|p| !p.quantity.is_finite()) {
            return Err(PricingError::InvalidInput(format!(
                "quantity of {} must be finite",
                p.instrument.instrument_id()
            )));
        }
        let scenarios = match custom {
            Some(shocks) if !shocks.is_empty() => shocks
                .iter()
                .map(|&shock| SpanScenario { shock, weight: 1.0 })
                .collect(),
            _ => self.standard_scenarios(),
        };

        let mut warnings = Vec::new();
        let base: Vec<f64> = positions
            .iter()
            .map(|p| {
                let outcome = self.pricer.price_auto(&p.instrument, snapshot)?;
                merge_warnings(&mut warnings, outcome.warnings);
                Ok(outcome.value * p.quantity)
            })
            .collect::<Result<_, PricingError>>()?;

        // rows: scenario, columns: weighted position P&L
        let rows = scenarios
            .par_iter()
            .map(|scenario| {
                let (shocked, mut row_warnings) = scenario.shock.apply(snapshot)?;
                let pnls = positions
                    .iter()
                    .zip(&base)
                    .map(|(p, base_value)| {
                        let outcome = self.pricer.price_auto(&p.instrument, &shocked)?;
                        row_warnings.extend(outcome.warnings);
                        Ok((outcome.value * p.quantity - base_value) * scenario.weight)
                    })
                    .collect::<Result<Vec<f64>, PricingError>>()?;
                Ok((pnls, row_warnings))
            })
            .collect::<Result<Vec<_>, PricingError>>()?;

        let mut scenario_pnls = Vec::with_capacity(rows.len());
        let mut grid = Vec::with_capacity(rows.len());
        for (pnls, row_warnings) in rows {
            merge_warnings(&mut warnings, row_warnings);
            scenario_pnls.push(pnls.iter().sum::<f64>());
            grid.push(pnls);
        }
        if scenario_pnls.iter().any(|v| !v.is_finite()) {
            return Err(PricingError::InternalConsistency(
                "non-finite scenario P&L in margin scan".to_string(),
            ));
        }

        let worst_scenario = scenario_pnls
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        let span_margin = worst_scenario.map_or(0.0, |i| (-scenario_pnls[i]).max(0.0));
        let initial_margin = span_margin;
        let maintenance_margin = self.section.maintenance_ratio * initial_margin;

        let position_margins = positions
            .iter()
            .enumerate()
            .map(|(j, p)| {
                let worst_own = grid.iter().map(|row| row[j]).fold(f64::INFINITY, f64::min);
                PositionMargin {
                    instrument_id: p.instrument.instrument_id().to_string(),
                    quantity: p.quantity,
                    base_value: base[j],
                    standalone_margin: (-worst_own).max(0.0),
                    worst_scenario_pnl: worst_scenario.map_or(0.0, |i| grid[i][j]),
                }
            })
            .collect();

        debug!(
            positions = positions.len(),
            scenarios = scenarios.len(),
            span_margin,
            "margin scan complete"
        );
        Ok(MarginCalculationResult {
            initial_margin,
            maintenance_margin,
            span_margin,
            worst_scenario,
            scenarios,
            scenario_pnls,
            position_margins,
            warnings,
            calculation_time_ms: start.elapsed().as_secs_f64() * 1_000.0,
        })
    }
}

fn merge_warnings(into: &mut Vec<String>, from: Vec<String>) {
    for w in from {
        if !into.contains(&w) {
            into.push(w);
        }
    }
}
