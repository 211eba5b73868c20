//! Structured products: notes on one or more underlyings with barrier,
//! coupon and call features.

use pricer_core::types::Date;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::barrier::BarrierFeature;
use super::error::InstrumentError;
use super::params::InstrumentTerms;
use super::payoff::PayoffParams;

/// Tolerance on the 100% basket weight sum.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// One underlying of a structured product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingAsset {
    /// Underlying symbol.
    pub symbol: String,
    /// Basket weight in percent.
    pub weight: f64,
    /// Initial reference (strike) level.
    pub initial_level: f64,
}

impl UnderlyingAsset {
    /// Creates an underlying entry.
    pub fn new(symbol: impl Into<String>, weight: f64, initial_level: f64) -> Self {
        Self {
            symbol: symbol.into(),
            weight,
            initial_level,
        }
    }
}

/// A dated amount per unit notional (coupon, call or put price).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAmount {
    /// Payment or exercise date.
    pub date: Date,
    /// Amount per unit notional.
    pub amount: f64,
}

/// Structured note.
///
/// Schedules are optional:
/// - `coupon_schedule`: unconditional fixed coupons
/// - `call_schedule`: issuer may redeem at the listed price
/// - `put_schedule`: holder may redeem at the listed price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredProduct {
    /// Common terms.
    pub terms: InstrumentTerms,
    /// Underlyings with weights and initial levels.
    pub underlyings: Vec<UnderlyingAsset>,
    /// Barrier features.
    #[serde(default)]
    pub barriers: Vec<BarrierFeature>,
    /// Payoff parameters.
    pub payoff: PayoffParams,
    /// Fixed coupons.
    #[serde(default)]
    pub coupon_schedule: Vec<ScheduledAmount>,
    /// Issuer call dates and prices.
    #[serde(default)]
    pub call_schedule: Vec<ScheduledAmount>,
    /// Holder put dates and prices.
    #[serde(default)]
    pub put_schedule: Vec<ScheduledAmount>,
}

impl StructuredProduct {
    /// Builds and validates a product without schedules.
    pub fn new(
        terms: InstrumentTerms,
        underlyings: Vec<UnderlyingAsset>,
        barriers: Vec<BarrierFeature>,
        payoff: PayoffParams,
    ) -> Result<Self, InstrumentError> {
        let product = Self {
            terms,
            underlyings,
            barriers,
            payoff,
            coupon_schedule: Vec::new(),
            call_schedule: Vec::new(),
            put_schedule: Vec::new(),
        };
        product.validate()?;
        Ok(product)
    }

    /// Adds fixed coupons.
    pub fn with_coupons(mut self, coupons: Vec<ScheduledAmount>) -> Result<Self, InstrumentError> {
        self.coupon_schedule = coupons;
        self.validate()?;
        Ok(self)
    }

    /// Adds issuer call dates.
    pub fn with_call_schedule(
        mut self,
        calls: Vec<ScheduledAmount>,
    ) -> Result<Self, InstrumentError> {
        self.call_schedule = calls;
        self.validate()?;
        Ok(self)
    }

    /// Adds holder put dates.
    pub fn with_put_schedule(mut self, puts: Vec<ScheduledAmount>) -> Result<Self, InstrumentError> {
        self.put_schedule = puts;
        self.validate()?;
        Ok(self)
    }

    /// Checks terms, underlyings, weights, barriers, payoff and schedules.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        self.terms.validate()?;
        self.payoff.validate()?;

        if self.underlyings.is_empty() {
            return Err(InstrumentError::InvalidParameter {
                message: "structured product has no underlyings".to_string(),
            });
        }
        let mut symbols = HashSet::new();
        for asset in &self.underlyings {
            if !(asset.initial_level.is_finite() && asset.initial_level > 0.0) {
                return Err(InstrumentError::InvalidParameter {
                    message: format!(
                        "initial level of {} must be positive, got {}",
                        asset.symbol, asset.initial_level
                    ),
                });
            }
            if !symbols.insert(asset.symbol.as_str()) {
                return Err(InstrumentError::InvalidParameter {
                    message: format!("duplicate underlying {}", asset.symbol),
                });
            }
        }

        let sum: f64 = self.underlyings.iter().map(|a| a.weight).sum();
        let negative = self
            .underlyings
            .iter()
            .any(|a| !a.weight.is_finite() || a.weight < 0.0);
        if negative || (self.is_basket() && (sum - 100.0).abs() > WEIGHT_SUM_TOLERANCE) {
            return Err(InstrumentError::InvalidWeights { sum });
        }

        let mut ids = HashSet::new();
        for barrier in &self.barriers {
            barrier.validate()?;
            if !symbols.contains(barrier.underlying.as_str()) {
                return Err(InstrumentError::InvalidBarrier {
                    id: barrier.id.to_string(),
                    message: format!("unknown underlying {}", barrier.underlying),
                });
            }
            if !ids.insert(&barrier.id) {
                return Err(InstrumentError::InvalidBarrier {
                    id: barrier.id.to_string(),
                    message: "duplicate barrier id".to_string(),
                });
            }
        }

        for entry in self
            .coupon_schedule
            .iter()
            .chain(&self.call_schedule)
            .chain(&self.put_schedule)
        {
            if entry.date > self.terms.expiry_date || !(entry.amount.is_finite() && entry.amount >= 0.0)
            {
                return Err(InstrumentError::InvalidParameter {
                    message: format!(
                        "schedule entry {} / {} outside product life or negative",
                        entry.date, entry.amount
                    ),
                });
            }
        }
        Ok(())
    }

    /// More than one underlying.
    #[inline]
    pub fn is_basket(&self) -> bool {
        self.underlyings.len() > 1
    }

    /// First barrier whose recorded hit has already ended the product.
    pub fn termination(&self) -> Option<&BarrierFeature> {
        self.barriers
            .iter()
            .find(|b| b.is_permanently_hit() && b.barrier_type.terminates())
    }

    /// Barriers that still influence the payoff.
    pub fn has_active_barrier(&self) -> bool {
        self.termination().is_none() && !self.barriers.is_empty()
    }

    /// Whether the product carries issuer call or holder put dates.
    pub fn has_early_redemption_schedule(&self) -> bool {
        !self.call_schedule.is_empty() || !self.put_schedule.is_empty()
    }

    /// Underlying entry for `symbol`.
    pub fn asset(&self, symbol: &str) -> Option<&UnderlyingAsset> {
        self.underlyings.iter().find(|a| a.symbol == symbol)
    }

    /// Weights as fractions summing to one. A single underlying has weight 1.
    pub fn weight_fractions(&self) -> Vec<f64> {
        if !self.is_basket() {
            return vec![1.0];
        }
        let total: f64 = self.underlyings.iter().map(|a| a.weight).sum();
        self.underlyings.iter().map(|a| a.weight / total).collect()
    }

    /// Weighted performance for final levels given in underlying order.
    pub fn performance(&self, finals: &[f64]) -> f64 {
        self.weight_fractions()
            .iter()
            .zip(&self.underlyings)
            .zip(finals)
            .map(|((w, asset), s)| w * s / asset.initial_level)
            .sum()
    }
}
