//! Market shocks and shock grids.

use pricer_core::market_data::MarketSnapshot;
use pricer_core::types::PricingError;
use serde::{Deserialize, Serialize};

use crate::config::ScenarioSection;

/// Volatility floor applied after a shock.
pub const MIN_SHOCKED_VOL: f64 = 0.01;

/// A joint shock to spots, volatilities and the rate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketShock {
    /// Relative spot move (0.1 = +10%).
    pub spot_pct: f64,
    /// Absolute volatility move (0.05 = +5 points).
    pub vol_shift: f64,
    /// Absolute rate move.
    pub rate_shift: f64,
}

impl MarketShock {
    /// Creates a shock.
    pub fn new(spot_pct: f64, vol_shift: f64, rate_shift: f64) -> Self {
        Self {
            spot_pct,
            vol_shift,
            rate_shift,
        }
    }

    /// Whether the shock leaves the market unchanged.
    pub fn is_identity(&self) -> bool {
        self.spot_pct == 0.0 && self.vol_shift == 0.0 && self.rate_shift == 0.0
    }

    /// Label such as `spot -10% / vol +5.0pt`.
    pub fn label(&self) -> String {
        let mut label = format!(
            "spot {:+.0}% / vol {:+.1}pt",
            self.spot_pct * 100.0,
            self.vol_shift * 100.0
        );
        if self.rate_shift != 0.0 {
            label.push_str(&format!(" / rate {:+.0}bp", self.rate_shift * 10_000.0));
        }
        label
    }

    /// Shocked copy of `snapshot`.
    ///
    /// Volatilities that would fall below [`MIN_SHOCKED_VOL`] are floored
    /// and reported in the returned warnings.
    pub fn apply(&self, snapshot: &MarketSnapshot) -> Result<(MarketSnapshot, Vec<String>), PricingError> {
        if self.spot_pct <= -1.0 {
            return Err(PricingError::InvalidInput(format!(
                "spot shock {} would make spots non-positive",
                self.spot_pct
            )));
        }
        let mut shocked = snapshot
            .with_spot_shift(self.spot_pct)
            .with_vol_shift(self.vol_shift)
            .with_rate_shift(self.rate_shift);
        let mut warnings = Vec::new();
        for quote in shocked.quotes.values_mut() {
            if quote.volatility < MIN_SHOCKED_VOL {
                warnings.push(format!(
                    "shocked volatility {:.4} for {} floored at {}",
                    quote.volatility, quote.symbol, MIN_SHOCKED_VOL
                ));
                quote.volatility = MIN_SHOCKED_VOL;
            }
        }
        Ok((shocked, warnings))
    }
}

/// Cartesian grid of spot and volatility shocks.
///
/// # Examples
///
/// ```
/// use pricer_risk::scenario::ScenarioGrid;
///
/// let grid = ScenarioGrid::default();
/// // 7 spot shocks x 3 volatility shocks
/// assert_eq!(grid.len(), 21);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioGrid {
    /// Relative spot shocks.
    pub spot_shocks: Vec<f64>,
    /// Absolute volatility shocks.
    pub vol_shocks: Vec<f64>,
    /// Rate shift applied to every cell.
    #[serde(default)]
    pub rate_shift: f64,
}

impl Default for ScenarioGrid {
    fn default() -> Self {
        let section = ScenarioSection::default();
        Self {
            spot_shocks: ladder(section.spot_min, section.spot_max, section.spot_step),
            vol_shocks: ladder(section.vol_min, section.vol_max, section.vol_step),
            rate_shift: 0.0,
        }
    }
}

impl ScenarioGrid {
    /// Explicit grid.
    pub fn new(spot_shocks: Vec<f64>, vol_shocks: Vec<f64>) -> Result<Self, PricingError> {
        if spot_shocks.is_empty() || vol_shocks.is_empty() {
            return Err(PricingError::InvalidInput("scenario grid axes must not be empty".to_string()));
        }
        if let Some(bad) = spot_shocks.iter().find(|s| !(s.is_finite() && **s > -1.0)) {
            return Err(PricingError::InvalidInput(format!("invalid spot shock {}", bad)));
        }
        if let Some(bad) = vol_shocks.iter().find(|s| !s.is_finite()) {
            return Err(PricingError::InvalidInput(format!("invalid volatility shock {}", bad)));
        }
        Ok(Self {
            spot_shocks,
            vol_shocks,
            rate_shift: 0.0,
        })
    }

    /// Grid from the scenario configuration section.
    pub fn from_config(section: &ScenarioSection) -> Result<Self, PricingError> {
        if !(section.spot_step > 0.0 && section.vol_step > 0.0) {
            return Err(PricingError::InvalidInput("scenario steps must be positive".to_string()));
        }
        Self::new(
            ladder(section.spot_min, section.spot_max, section.spot_step),
            ladder(section.vol_min, section.vol_max, section.vol_step),
        )
    }

    /// Adds a rate shift to every cell.
    pub fn with_rate_shift(mut self, shift: f64) -> Self {
        self.rate_shift = shift;
        self
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.spot_shocks.len() * self.vol_shocks.len()
    }

    /// Whether the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cells in spot-major order.
    pub fn shocks(&self) -> Vec<MarketShock> {
        self.spot_shocks
            .iter()
            .flat_map(|&spot| {
                self.vol_shocks
                    .iter()
                    .map(move |&vol| MarketShock::new(spot, vol, self.rate_shift))
            })
            .collect()
    }
}

/// Inclusive ladder `min, min + step, …, max`.
fn ladder(min: f64, max: f64, step: f64) -> Vec<f64> {
    if !(step > 0.0) || max < min {
        return vec![min];
    }
    let n = ((max - min) / step + 1e-9).floor() as usize;
    (0..=n)
        .map(|i| {
            let x = min + i as f64 * step;
            // strip accumulation noise so labels and lookups stay exact
            (x * 1e10).round() / 1e10
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_core::market_data::UnderlyingQuote;
    use pricer_core::types::Date;

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot::new(Date::from_ymd(2024, 1, 2).unwrap(), 0.03)
            .with_quote(UnderlyingQuote::new("ACME", 100.0, 0.04))
    }

    #[test]
    fn test_default_grid_axes() {
        let grid = ScenarioGrid::default();
        assert_eq!(grid.spot_shocks, vec![-0.3, -0.2, -0.1, 0.0, 0.1, 0.2, 0.3]);
        assert_eq!(grid.vol_shocks, vec![-0.05, 0.0, 0.05]);
        assert_eq!(grid.shocks().len(), 21);
        assert_eq!(grid.shocks()[0], MarketShock::new(-0.3, -0.05, 0.0));
    }

    #[test]
    fn test_apply_floors_volatility() {
        let (shocked, warnings) = MarketShock::new(-0.1, -0.05, 0.01).apply(&snapshot()).unwrap();
        let quote = shocked.quote("ACME").unwrap();
        assert_relative_eq!(quote.spot, 90.0, epsilon = 1e-12);
        assert_eq!(quote.volatility, MIN_SHOCKED_VOL);
        assert_relative_eq!(shocked.risk_free_rate, 0.04, epsilon = 1e-12);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_invalid_grids() {
        assert!(ScenarioGrid::new(vec![], vec![0.0]).is_err());
        assert!(ScenarioGrid::new(vec![-1.0], vec![0.0]).is_err());
        assert!(MarketShock::new(-1.0, 0.0, 0.0).apply(&snapshot()).is_err());
    }

    #[test]
    fn test_label() {
        assert_eq!(MarketShock::new(-0.1, 0.05, 0.0).label(), "spot -10% / vol +5.0pt");
        assert!(MarketShock::new(0.0, 0.0, 0.01).label().ends_with("rate +100bp"));
    }
}
