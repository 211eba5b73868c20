//! Barrier features attached to structured products.
//!
//! Eight barrier variants are supported:
//!
//! | Variant | Direction | Effect when hit | Recoverable |
//! |---|---|---|---|
//! | `DownAndOut` | down | knock-out, rebate paid | no |
//! | `UpAndOut` | up | knock-out, rebate paid | no |
//! | `DownAndIn` | down | capital at risk: redemption capped at performance | no |
//! | `UpAndIn` | up | payoff activated, otherwise principal only | no |
//! | `Autocall` | up | early redemption at `1 + coupon` | no |
//! | `CouponDown` | down | coupon missed while below | yes |
//! | `CouponUp` | up | coupon missed while above | yes |
//! | `CapitalProtection` | down | protection lost if final level below | yes |
//!
//! Levels below [`FRACTIONAL_LEVEL_LIMIT`] are fractions of the
//! underlying's initial reference level; larger values are absolute.

use pricer_core::types::Date;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::InstrumentError;

/// Levels strictly below this are read as a fraction of the initial level.
pub const FRACTIONAL_LEVEL_LIMIT: f64 = 10.0;

/// Identifier of a barrier, unique within its instrument.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BarrierId(pub String);

impl BarrierId {
    /// Creates an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        BarrierId(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BarrierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Side from which the barrier is approached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarrierDirection {
    /// Hit when spot falls to or below the level.
    Down,
    /// Hit when spot rises to or above the level.
    Up,
}

/// What a hit does to the payoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarrierEffect {
    /// Extinguishes the product; the rebate is paid.
    KnockOut,
    /// Activates a conditional payoff.
    KnockIn,
    /// Redeems the product early.
    EarlyRedemption,
    /// Suspends a periodic coupon.
    Coupon,
    /// Removes capital protection at maturity.
    Protection,
}

/// The eight barrier variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarrierType {
    /// Down-and-out knock-out.
    DownAndOut,
    /// Down-and-in: capital at risk once hit.
    DownAndIn,
    /// Up-and-out knock-out.
    UpAndOut,
    /// Up-and-in: payoff only once hit.
    UpAndIn,
    /// Autocall early redemption.
    Autocall,
    /// Coupon paid while spot stays above the level.
    CouponDown,
    /// Coupon paid while spot stays below the level.
    CouponUp,
    /// Capital protection lost if the final level is below the barrier.
    CapitalProtection,
}

impl BarrierType {
    /// All variants.
    pub const ALL: [BarrierType; 8] = [
        BarrierType::DownAndOut,
        BarrierType::DownAndIn,
        BarrierType::UpAndOut,
        BarrierType::UpAndIn,
        BarrierType::Autocall,
        BarrierType::CouponDown,
        BarrierType::CouponUp,
        BarrierType::CapitalProtection,
    ];

    /// Barrier direction.
    #[inline]
    pub fn direction(&self) -> BarrierDirection {
        match self {
            BarrierType::DownAndOut
            | BarrierType::DownAndIn
            | BarrierType::CouponDown
            | BarrierType::CapitalProtection => BarrierDirection::Down,
            BarrierType::UpAndOut
            | BarrierType::UpAndIn
            | BarrierType::Autocall
            | BarrierType::CouponUp => BarrierDirection::Up,
        }
    }

    /// Payoff effect of a hit.
    #[inline]
    pub fn effect(&self) -> BarrierEffect {
        match self {
            BarrierType::DownAndOut | BarrierType::UpAndOut => BarrierEffect::KnockOut,
            BarrierType::DownAndIn | BarrierType::UpAndIn => BarrierEffect::KnockIn,
            BarrierType::Autocall => BarrierEffect::EarlyRedemption,
            BarrierType::CouponDown | BarrierType::CouponUp => BarrierEffect::Coupon,
            BarrierType::CapitalProtection => BarrierEffect::Protection,
        }
    }

    /// Whether the barrier can return to a non-hit state.
    ///
    /// Knock-outs, knock-ins and autocalls are permanent once hit.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BarrierType::CouponDown | BarrierType::CouponUp | BarrierType::CapitalProtection
        )
    }

    /// Whether a hit ends the product.
    #[inline]
    pub fn terminates(&self) -> bool {
        matches!(
            self.effect(),
            BarrierEffect::KnockOut | BarrierEffect::EarlyRedemption
        )
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            BarrierType::DownAndOut => "down-and-out",
            BarrierType::DownAndIn => "down-and-in",
            BarrierType::UpAndOut => "up-and-out",
            BarrierType::UpAndIn => "up-and-in",
            BarrierType::Autocall => "autocall",
            BarrierType::CouponDown => "coupon-down",
            BarrierType::CouponUp => "coupon-up",
            BarrierType::CapitalProtection => "capital-protection",
        }
    }
}

/// How the barrier is monitored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BarrierObservation {
    /// American style: monitored continuously.
    #[default]
    Continuous,
    /// European style: checked only on the listed dates.
    Discrete {
        /// Observation dates
        dates: Vec<Date>,
    },
}

impl BarrierObservation {
    /// Whether `date` is an observation date. Always true for continuous
    /// monitoring.
    pub fn observes_on(&self, date: Date) -> bool {
        match self {
            BarrierObservation::Continuous => true,
            BarrierObservation::Discrete { dates } => dates.contains(&date),
        }
    }
}

/// Recorded hit state of a barrier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BarrierHitState {
    /// Whether the barrier has ever been hit.
    pub has_been_hit: bool,
    /// Date of the first recorded hit.
    pub hit_date: Option<Date>,
    /// Spot level at the first recorded hit.
    pub hit_level: Option<f64>,
}

impl BarrierHitState {
    /// State after a hit at `level` on `date`.
    pub fn hit(date: Date, level: f64) -> Self {
        Self {
            has_been_hit: true,
            hit_date: Some(date),
            hit_level: Some(level),
        }
    }
}

/// A barrier attached to a structured product.
///
/// # Examples
/// ```
/// use pricer_models::instruments::{BarrierFeature, BarrierType};
///
/// let barrier = BarrierFeature::new("B1", BarrierType::DownAndOut, "ACME", 0.7);
/// // 70% of a 140 initial level
/// assert!((barrier.resolve_level(140.0) - 98.0).abs() < 1e-12);
/// assert!((barrier.signed_distance(99.0, 98.0) - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrierFeature {
    /// Barrier identifier.
    pub id: BarrierId,
    /// Barrier variant.
    pub barrier_type: BarrierType,
    /// Monitored underlying symbol.
    pub underlying: String,
    /// Absolute level, or fraction of the initial level when below 10.
    pub level: f64,
    /// Monitoring style.
    #[serde(default)]
    pub observation: BarrierObservation,
    /// Rebate paid on knock-out, per unit notional.
    #[serde(default)]
    pub rebate: f64,
    /// Coupon per unit notional (autocall and coupon barriers).
    #[serde(default)]
    pub coupon: f64,
    /// Recorded hit state.
    #[serde(default)]
    pub hit_state: BarrierHitState,
}

impl BarrierFeature {
    /// Continuously monitored barrier with no rebate or coupon.
    pub fn new(
        id: impl Into<String>,
        barrier_type: BarrierType,
        underlying: impl Into<String>,
        level: f64,
    ) -> Self {
        Self {
            id: BarrierId::new(id),
            barrier_type,
            underlying: underlying.into(),
            level,
            observation: BarrierObservation::Continuous,
            rebate: 0.0,
            coupon: 0.0,
            hit_state: BarrierHitState::default(),
        }
    }

    /// Sets discrete observation dates.
    pub fn with_observation_dates(mut self, dates: Vec<Date>) -> Self {
        self.observation = BarrierObservation::Discrete { dates };
        self
    }

    /// Sets the knock-out rebate.
    pub fn with_rebate(mut self, rebate: f64) -> Self {
        self.rebate = rebate;
        self
    }

    /// Sets the coupon.
    pub fn with_coupon(mut self, coupon: f64) -> Self {
        self.coupon = coupon;
        self
    }

    /// Sets the recorded hit state.
    pub fn with_hit_state(mut self, state: BarrierHitState) -> Self {
        self.hit_state = state;
        self
    }

    /// Barrier direction.
    #[inline]
    pub fn direction(&self) -> BarrierDirection {
        self.barrier_type.direction()
    }

    /// Absolute barrier level given the underlying's initial level.
    #[inline]
    pub fn resolve_level(&self, initial_level: f64) -> f64 {
        if self.level < FRACTIONAL_LEVEL_LIMIT {
            self.level * initial_level
        } else {
            self.level
        }
    }

    /// Distance to the barrier, positive while not breached.
    ///
    /// Down barriers: `spot - barrier`; up barriers: `barrier - spot`.
    #[inline]
    pub fn signed_distance(&self, spot: f64, barrier: f64) -> f64 {
        match self.direction() {
            BarrierDirection::Down => spot - barrier,
            BarrierDirection::Up => barrier - spot,
        }
    }

    /// Whether `spot` is at or through the resolved level.
    #[inline]
    pub fn is_breached(&self, spot: f64, barrier: f64) -> bool {
        self.signed_distance(spot, barrier) <= 0.0
    }

    /// Whether a permanent hit has already been recorded.
    #[inline]
    pub fn is_permanently_hit(&self) -> bool {
        self.hit_state.has_been_hit && !self.barrier_type.is_recoverable()
    }

    /// Checks level, amounts and observation dates.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        let fail = |message: String| InstrumentError::InvalidBarrier {
            id: self.id.to_string(),
            message,
        };
        if !(self.level.is_finite() && self.level > 0.0) {
            return Err(fail(format!("level must be positive, got {}", self.level)));
        }
        if !(self.rebate.is_finite() && self.rebate >= 0.0) {
            return Err(fail(format!("rebate must be non-negative, got {}", self.rebate)));
        }
        if !(self.coupon.is_finite() && self.coupon >= 0.0) {
            return Err(fail(format!("coupon must be non-negative, got {}", self.coupon)));
        }
        if let BarrierObservation::Discrete { dates } = &self.observation {
            if dates.is_empty() {
                return Err(fail("discrete barrier has no observation dates".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_and_recovery_table() {
        let down: Vec<_> = BarrierType::ALL
            .iter()
            .filter(|b| b.direction() == BarrierDirection::Down)
            .collect();
        assert_eq!(down.len(), 4);

        let recoverable: Vec<_> = BarrierType::ALL
            .iter()
            .filter(|b| b.is_recoverable())
            .collect();
        assert_eq!(recoverable.len(), 3);
        assert!(BarrierType::Autocall.terminates());
        assert!(!BarrierType::DownAndIn.terminates());
    }

    #[test]
    fn test_absolute_level_is_not_scaled() {
        let b = BarrierFeature::new("B", BarrierType::UpAndOut, "X", 150.0);
        assert_eq!(b.resolve_level(100.0), 150.0);
    }

    #[test]
    fn test_breach_by_direction() {
        let down = BarrierFeature::new("D", BarrierType::DownAndOut, "X", 98.0);
        assert!(!down.is_breached(99.0, 98.0));
        assert!(down.is_breached(98.0, 98.0));

        let up = BarrierFeature::new("U", BarrierType::Autocall, "X", 1.1);
        assert!(up.is_breached(111.0, 110.0));
        assert!(!up.is_breached(109.0, 110.0));
    }

    #[test]
    fn test_permanent_hit() {
        let date = Date::from_ymd(2024, 3, 1).unwrap();
        let ko = BarrierFeature::new("K", BarrierType::DownAndOut, "X", 0.7)
            .with_hit_state(BarrierHitState::hit(date, 97.0));
        assert!(ko.is_permanently_hit());

        let coupon = BarrierFeature::new("C", BarrierType::CouponDown, "X", 0.7)
            .with_hit_state(BarrierHitState::hit(date, 97.0));
        assert!(!coupon.is_permanently_hit());
    }

    #[test]
    fn test_validation() {
        assert!(BarrierFeature::new("B", BarrierType::DownAndIn, "X", -1.0)
            .validate()
            .is_err());
        assert!(BarrierFeature::new("B", BarrierType::DownAndIn, "X", 0.6)
            .with_observation_dates(vec![])
            .validate()
            .is_err());
    }
}
