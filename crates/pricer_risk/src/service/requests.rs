//! Request and response records of the service façade.
//!
//! Every request is keyed by `instrument_id`; every response carries a
//! `warnings` channel and `calculation_time_ms`.

use std::collections::BTreeMap;

use pricer_core::market_data::UnderlyingQuote;
use pricer_core::types::Date;
use pricer_pricing::greeks::GreeksResult;
use pricer_pricing::implied_vol::ImpliedVolatilityAnalysis;
use pricer_pricing::selector::ModelType;
use serde::{Deserialize, Serialize};

use crate::barrier::{BarrierAlert, BarrierStatus, MonitoringSummary};
use crate::orchestrator::ValuationResult;
use crate::portfolio::PortfolioId;
use crate::scenario::{MarketShock, ScenarioAnalysis};

/// Greeks for one instrument, with optional market overrides on its
/// primary underlying.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreeksRequest {
    /// Instrument identifier.
    pub instrument_id: String,
    /// Spot override.
    pub underlying_price: Option<f64>,
    /// Volatility override.
    pub volatility: Option<f64>,
    /// Rate override.
    pub risk_free_rate: Option<f64>,
    /// Dividend yield override.
    pub dividend_yield: Option<f64>,
    /// Model override.
    pub model: Option<ModelType>,
}

/// Greeks response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreeksResponse {
    /// Instrument identifier.
    pub instrument_id: String,
    /// Greeks.
    pub greeks: GreeksResult,
    /// Non-fatal conditions.
    pub warnings: Vec<String>,
    /// Wall-clock time.
    pub calculation_time_ms: f64,
}

/// Implied volatility of a listed option from its market price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpliedVolatilityRequest {
    /// Instrument identifier; must reference an option.
    pub instrument_id: String,
    /// Observed option price per unit.
    pub option_price: f64,
    /// Spot override.
    pub underlying_price: Option<f64>,
    /// Time to expiry override in years.
    pub time_to_expiration: Option<f64>,
    /// Rate override.
    pub risk_free_rate: Option<f64>,
    /// Dividend yield override.
    pub dividend_yield: Option<f64>,
}

/// Implied volatility response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolatilityResponse {
    /// Instrument identifier.
    pub instrument_id: String,
    /// Solved volatility with rank, percentile, band and term structure.
    pub analysis: ImpliedVolatilityAnalysis,
    /// Non-fatal conditions.
    pub warnings: Vec<String>,
    /// Wall-clock time.
    pub calculation_time_ms: f64,
}

/// Full valuation of a structured product (or any instrument).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredProductValuationRequest {
    /// Instrument identifier.
    pub instrument_id: String,
    /// Snapshot date; latest when absent.
    pub valuation_date: Option<Date>,
    /// Model override.
    pub model_type: Option<ModelType>,
    /// Compute Greeks.
    pub include_greeks: bool,
    /// Run the configured scenario grid.
    pub scenario_analysis: bool,
}

/// Valuation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResponse {
    /// Instrument identifier.
    pub instrument_id: String,
    /// Value for the full notional.
    pub theoretical_value: f64,
    /// Quotes of the instrument's underlyings.
    pub market_data: Vec<UnderlyingQuote>,
    /// Model output, Greeks and barrier statuses.
    pub model_results: ValuationResult,
    /// Scenario grid, when requested.
    pub scenario_analysis: Option<ScenarioAnalysis>,
    /// Non-fatal conditions.
    pub warnings: Vec<String>,
    /// Wall-clock time.
    pub calculation_time_ms: f64,
}

/// Barrier monitoring across instruments and portfolios.
///
/// With neither list set, every instrument in the repository is scanned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierMonitoringRequest {
    /// Instruments to scan.
    pub instrument_ids: Option<Vec<String>>,
    /// Portfolios to scan.
    pub portfolio_ids: Option<Vec<PortfolioId>>,
    /// Approach threshold override in percent.
    pub alert_threshold: Option<f64>,
}

/// Barrier monitoring response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrierMonitoringResponse {
    /// Statuses of barriers on live instruments.
    pub active_barriers: Vec<BarrierStatus>,
    /// Alerts, most severe first.
    pub alerts: Vec<BarrierAlert>,
    /// Counts and nearest barrier.
    pub summary: MonitoringSummary,
    /// Non-fatal conditions.
    pub warnings: Vec<String>,
    /// Wall-clock time.
    pub calculation_time_ms: f64,
}

/// A position in a margin request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginPositionRequest {
    /// Instrument identifier.
    pub instrument_id: String,
    /// Units held; negative for short.
    pub quantity: f64,
}

/// SPAN-style margin for a set of positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginCalculationRequest {
    /// Positions.
    pub positions: Vec<MarginPositionRequest>,
    /// Spot per underlying; overrides the snapshot.
    pub underlying_prices: BTreeMap<String, f64>,
    /// Volatility per underlying; overrides the snapshot.
    pub volatilities: BTreeMap<String, f64>,
    /// Rate override.
    pub risk_free_rate: Option<f64>,
    /// Snapshot date; latest when absent.
    pub valuation_date: Option<Date>,
    /// Custom scan replacing the standard sixteen scenarios.
    pub scenario_shifts: Option<Vec<MarketShock>>,
}
