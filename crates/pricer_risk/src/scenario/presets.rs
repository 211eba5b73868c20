//! Preset stress scenarios.

use serde::{Deserialize, Serialize};

use super::shock::MarketShock;

/// Types of preset scenarios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresetScenarioType {
    /// Equity -20%, volatility +10 points
    MarketCrash,
    /// Volatility +10 points
    VolatilitySpike,
    /// Rates +100bp
    RateShock,
    /// Equity +15%, volatility -3 points
    Rally,
    /// Equity -10%, volatility +5 points, rates +200bp
    Stagflation,
}

impl PresetScenarioType {
    /// All presets.
    pub const ALL: [PresetScenarioType; 5] = [
        Self::MarketCrash,
        Self::VolatilitySpike,
        Self::RateShock,
        Self::Rally,
        Self::Stagflation,
    ];

    /// Get human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MarketCrash => "Market Crash",
            Self::VolatilitySpike => "Vol Spike",
            Self::RateShock => "IR +100bp",
            Self::Rally => "Rally",
            Self::Stagflation => "Stagflation",
        }
    }

    /// Get description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::MarketCrash => "Equity prices fall 20% while implied volatility rises 10 points",
            Self::VolatilitySpike => "Implied volatility increases 10 percentage points",
            Self::RateShock => "Parallel interest rate shift +100 basis points",
            Self::Rally => "Equity prices rise 15% while implied volatility falls 3 points",
            Self::Stagflation => "Equity -10%, implied volatility +5 points, rates +200 basis points",
        }
    }

    /// Shock applied by the preset.
    pub fn shock(&self) -> MarketShock {
        match self {
            Self::MarketCrash => MarketShock::new(-0.20, 0.10, 0.0),
            Self::VolatilitySpike => MarketShock::new(0.0, 0.10, 0.0),
            Self::RateShock => MarketShock::new(0.0, 0.0, 0.01),
            Self::Rally => MarketShock::new(0.15, -0.03, 0.0),
            Self::Stagflation => MarketShock::new(-0.10, 0.05, 0.02),
        }
    }
}

impl std::fmt::Display for PresetScenarioType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_distinct() {
        for (i, a) in PresetScenarioType::ALL.iter().enumerate() {
            for b in &PresetScenarioType::ALL[i + 1..] {
                assert_ne!(a.shock(), b.shock());
                assert_ne!(a.name(), b.name());
            }
            assert!(!a.shock().is_identity());
            assert!(!a.description().is_empty());
        }
    }

    #[test]
    fn test_crash_direction() {
        let shock = PresetScenarioType::MarketCrash.shock();
        assert!(shock.spot_pct < 0.0 && shock.vol_shift > 0.0);
        assert_eq!(PresetScenarioType::RateShock.to_string(), "IR +100bp");
    }
}
