//! Scenario execution engine.
//!
//! Every cell is an independent revaluation against its own shocked copy
//! of the snapshot; results are collected in input order.

use pricer_core::market_data::MarketSnapshot;
use pricer_core::types::PricingError;
use pricer_pricing::pricer::PriceOutcome;
use pricer_pricing::selector::ModelType;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::presets::PresetScenarioType;
use super::shock::{MarketShock, ScenarioGrid};

/// P&L of one scenario relative to the base case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPnL {
    /// Base value before the shock
    pub base_value: f64,
    /// Value under the shock
    pub stressed_value: f64,
    /// P&L (stressed - base)
    pub pnl: f64,
    /// P&L as a fraction of |base|; zero when base is zero
    pub pnl_pct: f64,
}

impl ScenarioPnL {
    /// Create a new scenario P&L result.
    pub fn new(base_value: f64, stressed_value: f64) -> Self {
        let pnl = stressed_value - base_value;
        let pnl_pct = if base_value != 0.0 { pnl / base_value.abs() } else { 0.0 };
        Self {
            base_value,
            stressed_value,
            pnl,
            pnl_pct,
        }
    }

    /// Check if P&L is a loss (negative).
    pub fn is_loss(&self) -> bool {
        self.pnl < 0.0
    }

    /// Check if P&L is a gain (positive).
    pub fn is_gain(&self) -> bool {
        self.pnl > 0.0
    }
}

/// One row of a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario label
    pub scenario_name: String,
    /// Applied shock
    pub shock: MarketShock,
    /// Model used for the shocked valuation
    pub model: ModelType,
    /// Value and P&L
    pub pnl: ScenarioPnL,
    /// Warnings from shocking and valuation
    pub warnings: Vec<String>,
}

/// Base case plus one row per scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    /// Value under the unshocked snapshot
    pub base_value: f64,
    /// Rows in input order
    pub results: Vec<ScenarioResult>,
    /// Warnings from the base valuation
    pub warnings: Vec<String>,
}

impl ScenarioAnalysis {
    /// Row with the most negative P&L.
    pub fn worst_case(&self) -> Option<&ScenarioResult> {
        self.results.iter().min_by(|a, b| a.pnl.pnl.total_cmp(&b.pnl.pnl))
    }

    /// Row with the most positive P&L.
    pub fn best_case(&self) -> Option<&ScenarioResult> {
        self.results.iter().max_by(|a, b| a.pnl.pnl.total_cmp(&b.pnl.pnl))
    }

    /// Row for an exact shock, if present.
    pub fn find(&self, shock: &MarketShock) -> Option<&ScenarioResult> {
        self.results.iter().find(|r| r.shock == *shock)
    }

    /// Number of rows.
    pub fn scenario_count(&self) -> usize {
        self.results.len()
    }
}

/// Runs shocks against a valuation function.
///
/// The valuation function must be free of shared mutable state; cells are
/// evaluated in parallel on the current rayon pool.
#[derive(Debug, Clone, Default)]
pub struct ScenarioEngine {
    scenarios: Vec<(String, MarketShock)>,
}

impl ScenarioEngine {
    /// Empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine loaded with every grid cell.
    pub fn from_grid(grid: &ScenarioGrid) -> Self {
        let mut engine = Self::new();
        for shock in grid.shocks() {
            engine.add_scenario(shock.label(), shock);
        }
        engine
    }

    /// Engine loaded with preset stress scenarios.
    pub fn from_presets(presets: &[PresetScenarioType]) -> Self {
        let mut engine = Self::new();
        for preset in presets {
            engine.add_scenario(preset.name(), preset.shock());
        }
        engine
    }

    /// Adds a named scenario.
    pub fn add_scenario(&mut self, name: impl Into<String>, shock: MarketShock) {
        self.scenarios.push((name.into(), shock));
    }

    /// Registered scenarios.
    pub fn scenarios(&self) -> &[(String, MarketShock)] {
        &self.scenarios
    }

    /// Number of registered scenarios.
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Values the base case and every scenario.
    ///
    /// The first failing cell aborts the run with its error.
    pub fn execute<F>(&self, snapshot: &MarketSnapshot, valuate: F) -> Result<ScenarioAnalysis, PricingError>
    where
        F: Fn(&MarketSnapshot) -> Result<PriceOutcome, PricingError> + Sync,
    {
        let base = valuate(snapshot)?;
        let base_value = base.value;

        let results = self
            .scenarios
            .par_iter()
            .map(|(name, shock)| {
                let (shocked, mut warnings) = shock.apply(snapshot)?;
                for w in &warnings {
                    warn!(scenario = %name, "{}", w);
                }
                let outcome = valuate(&shocked)?;
                warnings.extend(outcome.warnings);
                Ok(ScenarioResult {
                    scenario_name: name.clone(),
                    shock: *shock,
                    model: outcome.model,
                    pnl: ScenarioPnL::new(base_value, outcome.value),
                    warnings,
                })
            })
            .collect::<Result<Vec<_>, PricingError>>()?;

        debug!(scenarios = results.len(), base_value, "scenario run complete");
        Ok(ScenarioAnalysis {
            base_value,
            results,
            warnings: base.warnings,
        })
    }
}
