//! Payoff definitions.
//!
//! Vanilla payoffs are described by [`OptionType`]; structured notes by a
//! closed set of [`PayoffParams`] variants. Structured redemptions are
//! expressed per unit of notional as a function of the performance
//! `perf = S_T / S_0` (or the weighted basket performance).

use serde::{Deserialize, Serialize};

use super::error::InstrumentError;

/// Call or put.
///
/// # Examples
/// ```
/// use pricer_models::instruments::OptionType;
///
/// assert_eq!(OptionType::Call.intrinsic(110.0, 100.0), 10.0);
/// assert_eq!(OptionType::Put.intrinsic(110.0, 100.0), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    /// Right to buy: max(S - K, 0)
    Call,
    /// Right to sell: max(K - S, 0)
    Put,
}

impl OptionType {
    /// Exercise value at spot `s` for strike `k`.
    #[inline]
    pub fn intrinsic(&self, s: f64, k: f64) -> f64 {
        match self {
            OptionType::Call => (s - k).max(0.0),
            OptionType::Put => (k - s).max(0.0),
        }
    }

    /// +1 for calls, -1 for puts.
    #[inline]
    pub fn sign(&self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

/// Structured note payoff parameters.
///
/// Redemption per unit notional, with `perf` the final performance:
/// - `Participation { rate }`: `1 + rate * max(perf - 1, 0)`
/// - `Leveraged { factor }`: `max(1 + factor * (perf - 1), 0)`
/// - `Capped { cap }`: `1 + min(max(perf - 1, 0), cap)`
/// - `Digital { threshold, payout }`: `1 + payout` if `perf >= threshold`, else `1`
/// - `Basket { participation }`: participation on the weighted basket
///
/// # Examples
/// ```
/// use pricer_models::instruments::PayoffParams;
///
/// let capped = PayoffParams::capped(0.2).unwrap();
/// assert!((capped.redemption(1.5) - 1.2).abs() < 1e-12);
/// assert!(PayoffParams::leveraged(-1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PayoffParams {
    /// Capital-protected upside participation.
    Participation {
        /// Participation rate (1.0 = 100%)
        rate: f64,
    },
    /// Leveraged exposure to performance, floored at zero.
    Leveraged {
        /// Leverage factor
        factor: f64,
    },
    /// Capital-protected upside with a cap.
    Capped {
        /// Maximum return (0.25 = 25%)
        cap: f64,
    },
    /// Fixed payout when performance reaches a threshold.
    Digital {
        /// Performance threshold (1.0 = initial level)
        threshold: f64,
        /// Payout as a fraction of notional
        payout: f64,
    },
    /// Participation on a weighted basket.
    Basket {
        /// Participation rate
        participation: f64,
    },
}

impl PayoffParams {
    /// Validated participation payoff.
    pub fn participation(rate: f64) -> Result<Self, InstrumentError> {
        let p = PayoffParams::Participation { rate };
        p.validate()?;
        Ok(p)
    }

    /// Validated leveraged payoff.
    pub fn leveraged(factor: f64) -> Result<Self, InstrumentError> {
        let p = PayoffParams::Leveraged { factor };
        p.validate()?;
        Ok(p)
    }

    /// Validated capped payoff.
    pub fn capped(cap: f64) -> Result<Self, InstrumentError> {
        let p = PayoffParams::Capped { cap };
        p.validate()?;
        Ok(p)
    }

    /// Validated digital payoff.
    pub fn digital(threshold: f64, payout: f64) -> Result<Self, InstrumentError> {
        let p = PayoffParams::Digital { threshold, payout };
        p.validate()?;
        Ok(p)
    }

    /// Validated basket payoff.
    pub fn basket(participation: f64) -> Result<Self, InstrumentError> {
        let p = PayoffParams::Basket { participation };
        p.validate()?;
        Ok(p)
    }

    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        let (name, value, ok) = match *self {
            PayoffParams::Participation { rate } => ("participation rate", rate, rate >= 0.0),
            PayoffParams::Leveraged { factor } => ("leverage factor", factor, factor > 0.0),
            PayoffParams::Capped { cap } => ("cap", cap, cap >= 0.0),
            PayoffParams::Digital { threshold, payout } => {
                if !(threshold.is_finite() && threshold > 0.0) {
                    return Err(InstrumentError::InvalidPayoff {
                        message: format!("digital threshold must be positive, got {}", threshold),
                    });
                }
                ("digital payout", payout, payout >= 0.0)
            }
            PayoffParams::Basket { participation } => {
                ("basket participation", participation, participation >= 0.0)
            }
        };
        if value.is_finite() && ok {
            Ok(())
        } else {
            Err(InstrumentError::InvalidPayoff {
                message: format!("{} out of range: {}", name, value),
            })
        }
    }

    /// Redemption per unit notional for final performance `perf`.
    #[inline]
    pub fn redemption(&self, perf: f64) -> f64 {
        let upside = (perf - 1.0).max(0.0);
        match *self {
            PayoffParams::Participation { rate } => 1.0 + rate * upside,
            PayoffParams::Leveraged { factor } => (1.0 + factor * (perf - 1.0)).max(0.0),
            PayoffParams::Capped { cap } => 1.0 + upside.min(cap),
            PayoffParams::Digital { threshold, payout } => {
                if perf >= threshold {
                    1.0 + payout
                } else {
                    1.0
                }
            }
            PayoffParams::Basket { participation } => 1.0 + participation * upside,
        }
    }

    /// Variant name.
    pub fn name(&self) -> &'static str {
        match self {
            PayoffParams::Participation { .. } => "participation",
            PayoffParams::Leveraged { .. } => "leveraged",
            PayoffParams::Capped { .. } => "capped",
            PayoffParams::Digital { .. } => "digital",
            PayoffParams::Basket { .. } => "basket",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_participation_is_protected() {
        let p = PayoffParams::participation(0.8).unwrap();
        assert_relative_eq!(p.redemption(0.5), 1.0);
        assert_relative_eq!(p.redemption(1.25), 1.2, epsilon = 1e-12);
    }

    #[test]
    fn test_leveraged_floor() {
        let p = PayoffParams::leveraged(2.0).unwrap();
        assert_relative_eq!(p.redemption(1.1), 1.2, epsilon = 1e-12);
        assert_relative_eq!(p.redemption(0.3), 0.0);
    }

    #[test]
    fn test_digital_threshold_inclusive() {
        let p = PayoffParams::digital(1.0, 0.08).unwrap();
        assert_relative_eq!(p.redemption(1.0), 1.08);
        assert_relative_eq!(p.redemption(0.999), 1.0);
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(PayoffParams::participation(f64::NAN).is_err());
        assert!(PayoffParams::capped(-0.1).is_err());
        assert!(PayoffParams::digital(0.0, 0.1).is_err());
        assert!(PayoffParams::basket(-1.0).is_err());
    }

    #[test]
    fn test_serde_tagged() {
        let json = r#"{"type":"Capped","cap":0.3}"#;
        let p: PayoffParams = serde_json::from_str(json).unwrap();
        assert_eq!(p, PayoffParams::Capped { cap: 0.3 });
    }
}
