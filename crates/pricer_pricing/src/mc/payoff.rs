//! Path products: what a simulated path pays.
//!
//! A [`PathProduct`] is described in time (years from valuation) and compiled
//! against the simulation grid by the engine. Cashflows are expressed per
//! unit of the instrument (per option, per contract or per unit notional).

use pricer_models::instruments::{BarrierDirection, BarrierEffect, BarrierType, OptionType, PayoffParams};

use crate::lattice::step_for_time;

/// Broadie–Glasserman–Kou constant `ζ(1/2)/√(2π)`.
pub const BGK_BETA: f64 = 0.5826;

/// Terminal payoff of a path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathPayoff {
    /// European call or put on the first asset.
    Vanilla {
        /// Call or put
        option_type: OptionType,
        /// Strike
        strike: f64,
    },
    /// Long future on the first asset.
    Forward {
        /// Contract price
        contract: f64,
    },
    /// Note redemption on the weighted performance of all assets.
    Note {
        /// Payoff parameters
        payoff: PayoffParams,
        /// Weights as fractions, in asset order
        weights: Vec<f64>,
        /// Initial reference levels, in asset order
        initial_levels: Vec<f64>,
    },
}

impl PathPayoff {
    /// Weighted performance of `finals` (notes only; 1.0 otherwise).
    pub fn performance(&self, finals: &[f64]) -> f64 {
        match self {
            PathPayoff::Note {
                weights,
                initial_levels,
                ..
            } => weights
                .iter()
                .zip(initial_levels)
                .zip(finals)
                .map(|((w, s0), s)| w * s / s0)
                .sum(),
            _ => 1.0,
        }
    }

    fn terminal(&self, finals: &[f64]) -> f64 {
        match self {
            PathPayoff::Vanilla {
                option_type,
                strike,
            } => option_type.intrinsic(finals[0], *strike),
            PathPayoff::Forward { contract } => finals[0] - contract,
            PathPayoff::Note { payoff, .. } => payoff.redemption(self.performance(finals)),
        }
    }
}

/// When a barrier is monitored on the path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathObservation {
    /// Every time step, with optional continuity correction.
    Continuous,
    /// Only at the given times (years).
    Times(Vec<f64>),
}

/// Barrier monitored on a simulated path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathBarrier {
    /// Index of the monitored asset.
    pub asset: usize,
    /// Barrier variant.
    pub barrier_type: BarrierType,
    /// Absolute level.
    pub level: f64,
    /// Monitoring.
    pub observation: PathObservation,
    /// Knock-out rebate per unit.
    pub rebate: f64,
    /// Autocall or coupon-barrier coupon per unit.
    pub coupon: f64,
    /// Knock-in already recorded before valuation.
    pub already_hit: bool,
}

/// Product evaluated on every simulated path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathProduct {
    /// Terminal payoff.
    pub payoff: PathPayoff,
    /// Path barriers.
    pub barriers: Vec<PathBarrier>,
    /// Fixed coupons as `(time, amount)`, paid while the path is alive.
    pub coupons: Vec<(f64, f64)>,
}

impl PathProduct {
    /// Product with a terminal payoff only.
    pub fn terminal(payoff: PathPayoff) -> Self {
        Self {
            payoff,
            barriers: Vec::new(),
            coupons: Vec::new(),
        }
    }

    /// Adds a path barrier.
    pub fn with_barrier(mut self, barrier: PathBarrier) -> Self {
        self.barriers.push(barrier);
        self
    }

    /// Adds fixed coupons.
    pub fn with_coupons(mut self, coupons: Vec<(f64, f64)>) -> Self {
        self.coupons.extend(coupons);
        self
    }

    /// Whether any barrier is monitored.
    pub fn is_path_dependent(&self) -> bool {
        !self.barriers.is_empty() || !self.coupons.is_empty()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledBarrier {
    asset: usize,
    barrier_type: BarrierType,
    level: f64,
    observed: Vec<bool>,
    rebate: f64,
    coupon: f64,
    already_hit: bool,
}

impl CompiledBarrier {
    #[inline]
    fn breached(&self, s: f64) -> bool {
        match self.barrier_type.direction() {
            BarrierDirection::Down => s <= self.level,
            BarrierDirection::Up => s >= self.level,
        }
    }

    /// Coupon condition: above a down barrier, at or above an up barrier.
    #[inline]
    fn pays_coupon(&self, s: f64) -> bool {
        match self.barrier_type.direction() {
            BarrierDirection::Down => s > self.level,
            BarrierDirection::Up => s >= self.level,
        }
    }
}

/// A [`PathProduct`] mapped onto a uniform grid of `steps` steps.
#[derive(Debug, Clone)]
pub(crate) struct CompiledProduct<'a> {
    payoff: &'a PathPayoff,
    barriers: Vec<CompiledBarrier>,
    coupons: Vec<f64>,
    steps: usize,
}

impl<'a> CompiledProduct<'a> {
    /// Maps observation times to steps and applies the continuity
    /// correction to continuously monitored barriers.
    ///
    /// `vols[i]` is the volatility of asset `i`.
    pub(crate) fn compile(
        product: &'a PathProduct,
        expiry: f64,
        steps: usize,
        vols: &[f64],
        continuity_correction: bool,
    ) -> Self {
        let dt = expiry / steps as f64;
        let barriers = product
            .barriers
            .iter()
            .map(|b| {
                let mut observed = vec![false; steps + 1];
                let mut level = b.level;
                match &b.observation {
                    PathObservation::Continuous => {
                        observed.iter_mut().skip(1).for_each(|f| *f = true);
                        let shifted = matches!(
                            b.barrier_type.effect(),
                            BarrierEffect::KnockOut | BarrierEffect::KnockIn | BarrierEffect::EarlyRedemption
                        );
                        if continuity_correction && shifted {
                            let shift = BGK_BETA * vols.get(b.asset).copied().unwrap_or(0.0) * dt.sqrt();
                            level *= match b.barrier_type.direction() {
                                BarrierDirection::Down => (-shift).exp(),
                                BarrierDirection::Up => shift.exp(),
                            };
                        }
                    }
                    PathObservation::Times(times) => {
                        for &t in times {
                            if let Some(step) = step_for_time(t, expiry, steps) {
                                observed[step.max(1)] = true;
                            }
                        }
                    }
                }
                CompiledBarrier {
                    asset: b.asset,
                    barrier_type: b.barrier_type,
                    level,
                    observed,
                    rebate: b.rebate,
                    coupon: b.coupon,
                    already_hit: b.already_hit,
                }
            })
            .collect();

        let mut coupons = vec![0.0; steps + 1];
        for &(t, amount) in &product.coupons {
            if let Some(step) = step_for_time(t, expiry, steps) {
                coupons[step.max(1)] += amount;
            }
        }

        Self {
            payoff: &product.payoff,
            barriers,
            coupons,
            steps,
        }
    }

    /// Scratch buffers sized for this product.
    pub(crate) fn scratch(&self, n_assets: usize) -> PathScratch {
        PathScratch {
            finals: vec![0.0; n_assets],
            knocked_in: vec![false; self.barriers.len()],
            observations: vec![0; self.barriers.len()],
            coupon_hits: vec![0; self.barriers.len()],
        }
    }

    /// Discounted value of one path.
    ///
    /// `path` is asset-major with stride `steps + 1`; `discount[i]` is the
    /// discount factor to step `i`.
    pub(crate) fn evaluate(&self, path: &[f64], discount: &[f64], scratch: &mut PathScratch) -> f64 {
        let stride = self.steps + 1;
        for (flag, b) in scratch.knocked_in.iter_mut().zip(&self.barriers) {
            *flag = b.already_hit;
        }
        scratch.observations.iter_mut().for_each(|n| *n = 0);
        scratch.coupon_hits.iter_mut().for_each(|n| *n = 0);
        let mut pv = 0.0;

        for step in 1..=self.steps {
            for (i, b) in self.barriers.iter().enumerate() {
                if !b.observed[step] {
                    continue;
                }
                let s = path[b.asset * stride + step];
                match b.barrier_type.effect() {
                    BarrierEffect::KnockOut if b.breached(s) => {
                        return pv + (b.rebate + self.accrued(scratch)) * discount[step];
                    }
                    BarrierEffect::EarlyRedemption if b.breached(s) => {
                        return pv + (1.0 + b.coupon + self.accrued(scratch)) * discount[step];
                    }
                    BarrierEffect::KnockIn if b.breached(s) => scratch.knocked_in[i] = true,
                    BarrierEffect::Coupon => {
                        scratch.observations[i] += 1;
                        if b.pays_coupon(s) {
                            scratch.coupon_hits[i] += 1;
                        }
                    }
                    _ => {}
                }
            }
            pv += self.coupons[step] * discount[step];
        }

        for (a, f) in scratch.finals.iter_mut().enumerate() {
            *f = path[a * stride + self.steps];
        }
        let finals = &scratch.finals;
        let mut value = self.payoff.terminal(finals);
        let perf = self.payoff.performance(finals);
        for (b, &hit) in self.barriers.iter().zip(&scratch.knocked_in) {
            match b.barrier_type {
                BarrierType::DownAndIn if hit => value = value.min(perf),
                BarrierType::UpAndIn if !hit => value = 1.0,
                BarrierType::CapitalProtection if b.breached(finals[b.asset]) => value = value.min(perf),
                _ => {}
            }
        }
        pv + (value + self.accrued(scratch)) * discount[self.steps]
    }

    fn accrued(&self, scratch: &PathScratch) -> f64 {
        self.barriers
            .iter()
            .zip(scratch.observations.iter().zip(&scratch.coupon_hits))
            .filter(|(_, (&n, _))| n > 0)
            .map(|(b, (&n, &h))| b.coupon * h as f64 / n as f64)
            .sum()
    }
}

/// Per-path working state, reused across the paths of a chunk.
#[derive(Debug, Clone)]
pub(crate) struct PathScratch {
    finals: Vec<f64>,
    knocked_in: Vec<bool>,
    observations: Vec<u32>,
    coupon_hits: Vec<u32>,
}
