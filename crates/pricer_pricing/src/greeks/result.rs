//! Greeks calculation result type.

use serde::{Deserialize, Serialize};

use crate::selector::ModelType;

/// Price and sensitivities of a position.
///
/// Values are in position units (already scaled by notional). Theta is per
/// year of calendar time; vega and rho are per unit (1.00 = 100%) move.
/// Cash-equivalent conversions are computed on demand and never stored.
///
/// For multi-underlying instruments the spot bump moves every underlying by
/// the same relative amount, and `delta`, `gamma` and `vanna` are expressed
/// per unit of the primary (first) underlying's spot. `delta_cash` is then
/// the value change for a 100% move of the whole basket and does not depend
/// on which underlying is primary.
///
/// # First-Order Greeks
///
/// - `delta`: ∂V/∂S
/// - `vega`: ∂V/∂σ
/// - `theta`: ∂V/∂t
/// - `rho`: ∂V/∂r
///
/// # Second-Order Greeks
///
/// - `gamma`: ∂²V/∂S²
/// - `vanna`: ∂²V/∂S∂σ
/// - `volga`: ∂²V/∂σ²
/// - `charm`: ∂Δ/∂t (analytic only)
/// - `color`: ∂Γ/∂t (analytic only)
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::greeks::GreeksResult;
///
/// let result = GreeksResult {
///     price: 10.45,
///     spot: 100.0,
///     delta: 0.6368,
///     theta: -6.414,
///     vega: 37.52,
///     ..Default::default()
/// };
///
/// assert!((result.delta_cash() - 63.68).abs() < 1e-9);
/// assert!((result.vega_per_point() - 0.3752).abs() < 1e-9);
/// assert!((result.theta_daily() + 6.414 / 365.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GreeksResult {
    /// Present value of the position.
    pub price: f64,
    /// Spot of the primary underlying used for cash conversions.
    pub spot: f64,
    /// ∂V/∂S; for baskets, per unit of primary spot under a uniform move.
    pub delta: f64,
    /// ∂²V/∂S²
    pub gamma: f64,
    /// ∂V/∂t per year.
    pub theta: f64,
    /// ∂V/∂σ per unit volatility.
    pub vega: f64,
    /// ∂V/∂r per unit rate.
    pub rho: f64,
    /// ∂²V/∂S∂σ
    pub vanna: Option<f64>,
    /// ∂²V/∂σ²
    pub volga: Option<f64>,
    /// ∂Δ/∂t per year.
    pub charm: Option<f64>,
    /// ∂Γ/∂t per year.
    pub color: Option<f64>,
    /// Standard error of the base price (Monte Carlo only).
    pub std_error: Option<f64>,
    /// Engine used.
    pub model: ModelType,
    /// Non-fatal conditions.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Default for GreeksResult {
    fn default() -> Self {
        Self {
            price: 0.0,
            spot: 0.0,
            delta: 0.0,
            gamma: 0.0,
            theta: 0.0,
            vega: 0.0,
            rho: 0.0,
            vanna: None,
            volga: None,
            charm: None,
            color: None,
            std_error: None,
            model: ModelType::ClosedForm,
            warnings: Vec::new(),
        }
    }
}

impl GreeksResult {
    /// Position change for a one-unit move in spot, in currency: `Δ·S`.
    #[inline]
    pub fn delta_cash(&self) -> f64 {
        self.delta * self.spot
    }

    /// Delta change for a 1% spot move, in currency: `Γ·S²/100`.
    #[inline]
    pub fn gamma_cash(&self) -> f64 {
        self.gamma * self.spot * self.spot / 100.0
    }

    /// Value decay per calendar day.
    #[inline]
    pub fn theta_daily(&self) -> f64 {
        self.theta / 365.0
    }

    /// Value change for a one volatility point (1%) move.
    #[inline]
    pub fn vega_per_point(&self) -> f64 {
        self.vega / 100.0
    }

    /// Value change for a one basis point rate move.
    #[inline]
    pub fn rho_per_bp(&self) -> f64 {
        self.rho / 10_000.0
    }

    /// 95% confidence half-width of the price, zero for deterministic engines.
    #[inline]
    pub fn confidence_95(&self) -> f64 {
        1.96 * self.std_error.unwrap_or(0.0)
    }

    /// Whether any second-order cross Greek is available.
    #[inline]
    pub fn has_second_order(&self) -> bool {
        self.vanna.is_some() || self.volga.is_some()
    }
}
