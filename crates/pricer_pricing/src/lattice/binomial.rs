//! Cox-Ross-Rubinstein binomial lattice.
//!
//! Recombining tree with `u = e^(σ√dt)`, `d = 1/u` and risk-neutral
//! probability `p = (e^((r−q)dt) − d) / (u − d)`. Values are rolled back in
//! a single array, so memory is O(N) and time O(N²).
//!
//! Per node, after discounting the continuation value:
//! 1. an observed, breached knock-out or autocall barrier replaces the value
//! 2. otherwise holder exercise takes `max(continuation, intrinsic)`
//! 3. an issuer call caps the value, a holder put floors it
//! 4. fixed coupons falling on the step are added

use pricer_core::types::PricingError;
use pricer_models::instruments::{BarrierDirection, OptionType, PayoffParams};

/// Market inputs for a single-underlying lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeParams {
    /// Current spot.
    pub spot: f64,
    /// Risk-free rate.
    pub rate: f64,
    /// Dividend yield.
    pub dividend: f64,
    /// Volatility.
    pub volatility: f64,
    /// Years to expiry.
    pub expiry: f64,
}

/// Terminal (and exercise) value of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodePayoff {
    /// Call or put.
    Vanilla {
        /// Call or put
        option_type: OptionType,
        /// Strike
        strike: f64,
    },
    /// Long future struck at `contract`.
    Forward {
        /// Contract price
        contract: f64,
    },
    /// Structured note redemption per unit notional.
    Note {
        /// Payoff parameters
        payoff: PayoffParams,
        /// Initial reference level
        initial_level: f64,
    },
}

impl NodePayoff {
    /// Payoff at spot `s`.
    #[inline]
    pub fn value(&self, s: f64) -> f64 {
        match *self {
            NodePayoff::Vanilla {
                option_type,
                strike,
            } => option_type.intrinsic(s, strike),
            NodePayoff::Forward { contract } => s - contract,
            NodePayoff::Note {
                payoff,
                initial_level,
            } => payoff.redemption(s / initial_level),
        }
    }
}

/// Barrier enforced on the lattice nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBarrier {
    /// Breach side.
    pub direction: BarrierDirection,
    /// Absolute level.
    pub level: f64,
    /// Node value once breached (rebate, or redemption amount).
    pub value_if_hit: f64,
    /// Steps on which the barrier is observed.
    pub observed: Vec<bool>,
}

impl NodeBarrier {
    #[inline]
    fn breached(&self, step: usize, s: f64) -> bool {
        self.observed.get(step).copied().unwrap_or(false)
            && match self.direction {
                BarrierDirection::Down => s <= self.level,
                BarrierDirection::Up => s >= self.level,
            }
    }
}

/// Product description on a fixed number of steps.
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeSpec {
    steps: usize,
    payoff: NodePayoff,
    exercise: Vec<bool>,
    barriers: Vec<NodeBarrier>,
    calls: Vec<Option<f64>>,
    puts: Vec<Option<f64>>,
    coupons: Vec<f64>,
}

impl LatticeSpec {
    /// European product paying `payoff` at the last step.
    pub fn new(payoff: NodePayoff, steps: usize) -> Self {
        Self {
            steps,
            payoff,
            exercise: vec![false; steps + 1],
            barriers: Vec::new(),
            calls: vec![None; steps + 1],
            puts: vec![None; steps + 1],
            coupons: vec![0.0; steps + 1],
        }
    }

    /// Holder may exercise at every step.
    pub fn american(mut self) -> Self {
        self.exercise.iter_mut().for_each(|f| *f = true);
        self
    }

    /// Holder may exercise on the given steps.
    pub fn with_exercise_steps(mut self, steps: &[usize]) -> Self {
        for &i in steps {
            if let Some(flag) = self.exercise.get_mut(i) {
                *flag = true;
            }
        }
        self
    }

    /// Adds a node barrier.
    pub fn with_barrier(mut self, barrier: NodeBarrier) -> Self {
        self.barriers.push(barrier);
        self
    }

    /// Issuer call at `price` on `step`.
    pub fn with_call(mut self, step: usize, price: f64) -> Self {
        if let Some(slot) = self.calls.get_mut(step) {
            *slot = Some(slot.map_or(price, |p| p.min(price)));
        }
        self
    }

    /// Holder put at `price` on `step`.
    pub fn with_put(mut self, step: usize, price: f64) -> Self {
        if let Some(slot) = self.puts.get_mut(step) {
            *slot = Some(slot.map_or(price, |p| p.max(price)));
        }
        self
    }

    /// Fixed coupon paid on `step`.
    pub fn with_coupon(mut self, step: usize, amount: f64) -> Self {
        if let Some(slot) = self.coupons.get_mut(step) {
            *slot += amount;
        }
        self
    }

    /// Number of steps.
    pub fn steps(&self) -> usize {
        self.steps
    }

    #[inline]
    fn settle(&self, step: usize, s: f64, continuation: f64) -> f64 {
        if let Some(barrier) = self.barriers.iter().find(|b| b.breached(step, s)) {
            return barrier.value_if_hit;
        }
        let mut value = continuation;
        if self.exercise[step] {
            value = value.max(self.payoff.value(s));
        }
        if let Some(call) = self.calls[step] {
            value = value.min(call);
        }
        if let Some(put) = self.puts[step] {
            value = value.max(put);
        }
        value + self.coupons[step]
    }
}

/// Maps a time in years to the nearest lattice step.
///
/// Returns `None` for times at or before valuation or after expiry.
pub fn step_for_time(t: f64, expiry: f64, steps: usize) -> Option<usize> {
    if t <= 0.0 || expiry <= 0.0 || t > expiry * (1.0 + 1e-9) {
        return None;
    }
    let idx = ((t / expiry) * steps as f64).round() as usize;
    Some(idx.min(steps))
}

/// Lattice valuation output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeResult {
    /// Value at the root.
    pub value: f64,
    /// Tree depth.
    pub steps: usize,
    /// Risk-neutral up probability.
    pub probability: f64,
}

/// Binomial tree engine.
///
/// # Examples
///
/// ```
/// use pricer_pricing::lattice::{BinomialTree, LatticeParams, LatticeSpec, NodePayoff};
/// use pricer_models::instruments::OptionType;
///
/// let params = LatticeParams { spot: 100.0, rate: 0.05, dividend: 0.0, volatility: 0.2, expiry: 1.0 };
/// let tree = BinomialTree::new(500);
/// let payoff = NodePayoff::Vanilla { option_type: OptionType::Put, strike: 100.0 };
///
/// let european = tree.price(&params, &LatticeSpec::new(payoff, 500)).unwrap();
/// let american = tree.price(&params, &LatticeSpec::new(payoff, 500).american()).unwrap();
/// assert!(american.value > european.value);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinomialTree {
    steps: usize,
}

impl BinomialTree {
    /// Creates a tree with `steps` time steps.
    pub fn new(steps: usize) -> Self {
        Self { steps }
    }

    /// Tree depth.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Backward-induces `spec` on the tree.
    pub fn price(&self, params: &LatticeParams, spec: &LatticeSpec) -> Result<LatticeResult, PricingError> {
        let n = self.steps;
        if n == 0 || spec.steps != n {
            return Err(PricingError::InvalidInput(format!(
                "lattice steps mismatch: tree {} / product {}",
                n, spec.steps
            )));
        }
        if !(params.volatility.is_finite() && params.volatility > 0.0) {
            return Err(PricingError::InvalidInput(format!(
                "volatility must be positive, got {}",
                params.volatility
            )));
        }
        if !(params.spot.is_finite() && params.spot > 0.0) {
            return Err(PricingError::InvalidInput(format!(
                "spot must be positive, got {}",
                params.spot
            )));
        }
        if params.expiry <= 0.0 {
            return Err(PricingError::InvalidInput(
                "lattice requires positive time to expiry".to_string(),
            ));
        }

        let dt = params.expiry / n as f64;
        let u = (params.volatility * dt.sqrt()).exp();
        let d = 1.0 / u;
        let growth = ((params.rate - params.dividend) * dt).exp();
        let p = (growth - d) / (u - d);
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(PricingError::InvalidInput(format!(
                "risk-neutral probability {} outside [0, 1]; increase lattice steps",
                p
            )));
        }
        let disc = (-params.rate * dt).exp();
        let disc_p = disc * p;
        let disc_1mp = disc * (1.0 - p);
        let ratio = u / d;

        let mut values = vec![0.0_f64; n + 1];
        let mut s = params.spot * d.powi(n as i32);
        for value in values.iter_mut() {
            *value = spec.settle(n, s, spec.payoff.value(s));
            s *= ratio;
        }
        // settle() at expiry applies exercise with continuation == payoff,
        // which leaves the terminal value unchanged.

        let mut base = params.spot * d.powi(n as i32 - 1);
        for i in (0..n).rev() {
            let mut s = base;
            for j in 0..=i {
                let continuation = disc_p * values[j + 1] + disc_1mp * values[j];
                values[j] = spec.settle(i, s, continuation);
                s *= ratio;
            }
            base *= u;
        }

        let value = values[0];
        if !value.is_finite() {
            return Err(PricingError::InternalConsistency(format!(
                "lattice produced non-finite value {}",
                value
            )));
        }
        Ok(LatticeResult {
            value,
            steps: n,
            probability: p,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytical::BlackScholes;
    use approx::assert_relative_eq;

    fn params() -> LatticeParams {
        LatticeParams {
            spot: 100.0,
            rate: 0.05,
            dividend: 0.0,
            volatility: 0.2,
            expiry: 1.0,
        }
    }

    fn call() -> NodePayoff {
        NodePayoff::Vanilla {
            option_type: OptionType::Call,
            strike: 100.0,
        }
    }

    #[test]
    fn test_converges_to_black_scholes() {
        let tree = BinomialTree::new(2000);
        let lattice = tree.price(&params(), &LatticeSpec::new(call(), 2000)).unwrap();
        let bs = BlackScholes::new(100.0, 0.05, 0.0, 0.2).unwrap().price_call(100.0, 1.0);
        assert!(
            ((lattice.value - bs) / bs).abs() < 1e-3,
            "lattice {} vs closed form {}",
            lattice.value,
            bs
        );
    }

    #[test]
    fn test_american_call_without_dividends_equals_european() {
        let tree = BinomialTree::new(400);
        let eu = tree.price(&params(), &LatticeSpec::new(call(), 400)).unwrap();
        let am = tree.price(&params(), &LatticeSpec::new(call(), 400).american()).unwrap();
        assert_relative_eq!(eu.value, am.value, epsilon = 1e-10);
    }

    #[test]
    fn test_bermudan_between_european_and_american() {
        let put = NodePayoff::Vanilla {
            option_type: OptionType::Put,
            strike: 110.0,
        };
        let tree = BinomialTree::new(400);
        let eu = tree.price(&params(), &LatticeSpec::new(put, 400)).unwrap().value;
        let berm = tree
            .price(&params(), &LatticeSpec::new(put, 400).with_exercise_steps(&[100, 200, 300]))
            .unwrap()
            .value;
        let am = tree.price(&params(), &LatticeSpec::new(put, 400).american()).unwrap().value;
        assert!(eu < berm && berm < am, "{} < {} < {}", eu, berm, am);
    }

    #[test]
    fn test_knock_out_barrier_truncates_value() {
        let steps = 300;
        let note = NodePayoff::Note {
            payoff: PayoffParams::Participation { rate: 1.0 },
            initial_level: 100.0,
        };
        let plain = BinomialTree::new(steps)
            .price(&params(), &LatticeSpec::new(note, steps))
            .unwrap()
            .value;
        let barrier = NodeBarrier {
            direction: BarrierDirection::Up,
            level: 130.0,
            value_if_hit: 0.0,
            observed: vec![true; steps + 1],
        };
        let knocked = BinomialTree::new(steps)
            .price(&params(), &LatticeSpec::new(note, steps).with_barrier(barrier))
            .unwrap()
            .value;
        assert!(knocked < plain);
        assert!(knocked > 0.0);
    }

    #[test]
    fn test_forward_payoff_matches_cost_of_carry() {
        let spec = LatticeSpec::new(NodePayoff::Forward { contract: 100.0 }, 200);
        let v = BinomialTree::new(200).price(&params(), &spec).unwrap().value;
        assert_relative_eq!(v, 100.0 - 100.0 * (-0.05f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn test_issuer_call_caps_value() {
        let note = NodePayoff::Note {
            payoff: PayoffParams::Participation { rate: 1.0 },
            initial_level: 100.0,
        };
        let base = LatticeSpec::new(note, 200);
        let callable = LatticeSpec::new(note, 200).with_call(100, 1.0);
        let tree = BinomialTree::new(200);
        assert!(tree.price(&params(), &callable).unwrap().value < tree.price(&params(), &base).unwrap().value);
    }

    #[test]
    fn test_probability_out_of_range_is_rejected() {
        let mut p = params();
        p.rate = 5.0;
        p.volatility = 0.01;
        let result = BinomialTree::new(2).price(&p, &LatticeSpec::new(call(), 2));
        assert!(matches!(result, Err(PricingError::InvalidInput(_))));
    }

    #[test]
    fn test_step_mapping() {
        assert_eq!(step_for_time(0.5, 1.0, 100), Some(50));
        assert_eq!(step_for_time(0.0, 1.0, 100), None);
        assert_eq!(step_for_time(1.5, 1.0, 100), None);
    }
}
