//! Scenario and stress analysis.
//!
//! - [`ScenarioGrid`]: spot × volatility shock grid
//! - [`PresetScenarioType`]: named stress scenarios
//! - [`ScenarioEngine`]: parallel revaluation and P&L against the base case

mod engine;
mod presets;
mod shock;

pub use engine::{ScenarioAnalysis, ScenarioEngine, ScenarioPnL, ScenarioResult};
pub use presets::PresetScenarioType;
pub use shock::{MarketShock, ScenarioGrid, MIN_SHOCKED_VOL};
