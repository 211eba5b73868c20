//! Closed-form valuation of single-underlying structured notes by static
//! replication.
//!
//! Per unit notional, with `S0` the initial level and `B` a zero-coupon
//! bond `e^(−rT)`:
//!
//! | Payoff | Replication |
//! |---|---|
//! | Participation / Basket (single name) | `B + rate · C(S0) / S0` |
//! | Capped | `B + [C(S0) − C(S0(1 + cap))] / S0` |
//! | Leveraged | `f / S0 · C(S0(1 − 1/f))`, a forward when the strike is not positive |
//! | Digital | `B + payout · D(threshold · S0)` with `D` a cash-or-nothing call |
//!
//! Fixed coupons are added as discounted cash amounts.

use pricer_models::instruments::{OptionType, PayoffParams, ScheduledAmount};

use super::black_scholes::BlackScholes;

/// Inputs for replicating a single-name note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplicationInputs {
    /// Current spot.
    pub spot: f64,
    /// Initial reference level.
    pub initial_level: f64,
    /// Risk-free rate.
    pub rate: f64,
    /// Dividend yield.
    pub dividend: f64,
    /// Years to maturity.
    pub expiry: f64,
}

/// Value per unit notional of the final redemption.
pub fn replicate_redemption(model: &BlackScholes, payoff: &PayoffParams, inputs: &ReplicationInputs) -> f64 {
    let s0 = inputs.initial_level;
    let t = inputs.expiry;
    let bond = (-inputs.rate * t).exp();
    let call = |k: f64| model.price(k, t, OptionType::Call);

    match *payoff {
        PayoffParams::Participation { rate } => bond + rate * call(s0) / s0,
        PayoffParams::Basket { participation } => bond + participation * call(s0) / s0,
        PayoffParams::Capped { cap } => bond + (call(s0) - call(s0 * (1.0 + cap))) / s0,
        PayoffParams::Leveraged { factor } => {
            let strike = s0 * (1.0 - 1.0 / factor);
            if strike > 0.0 {
                factor / s0 * call(strike)
            } else {
                let forward = inputs.spot * (-inputs.dividend * t).exp() - strike * bond;
                factor / s0 * forward
            }
        }
        PayoffParams::Digital { threshold, payout } => {
            bond + payout * model.digital_call(threshold * s0, t)
        }
    }
}

/// Present value per unit notional of coupons paid strictly after `t = 0`.
///
/// `year_fraction` maps a scheduled date to years from valuation.
pub fn coupon_value<F>(coupons: &[ScheduledAmount], rate: f64, year_fraction: F) -> f64
where
    F: Fn(&ScheduledAmount) -> f64,
{
    coupons
        .iter()
        .map(|c| (c, year_fraction(c)))
        .filter(|(_, t)| *t > 0.0)
        .map(|(c, t)| c.amount * (-rate * t).exp())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn inputs() -> ReplicationInputs {
        ReplicationInputs {
            spot: 100.0,
            initial_level: 100.0,
            rate: 0.05,
            dividend: 0.0,
            expiry: 1.0,
        }
    }

    fn model() -> BlackScholes {
        BlackScholes::new(100.0, 0.05, 0.0, 0.2).unwrap()
    }

    #[test]
    fn test_full_participation_is_bond_plus_call() {
        let v = replicate_redemption(&model(), &PayoffParams::Participation { rate: 1.0 }, &inputs());
        assert_relative_eq!(v, (-0.05f64).exp() + 0.104506, epsilon = 1e-4);
    }

    #[test]
    fn test_unit_leverage_is_forward() {
        let v = replicate_redemption(&model(), &PayoffParams::Leveraged { factor: 1.0 }, &inputs());
        // Payoff is perf itself
        assert_relative_eq!(v, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cap_reduces_value() {
        let uncapped = replicate_redemption(&model(), &PayoffParams::Participation { rate: 1.0 }, &inputs());
        let capped = replicate_redemption(&model(), &PayoffParams::Capped { cap: 0.1 }, &inputs());
        assert!(capped < uncapped);
        assert!(capped > (-0.05f64).exp());
    }

    #[test]
    fn test_coupons_skip_past_dates() {
        use pricer_core::types::Date;
        let coupons = vec![
            ScheduledAmount { date: Date::from_ymd(2024, 1, 1).unwrap(), amount: 0.02 },
            ScheduledAmount { date: Date::from_ymd(2025, 1, 1).unwrap(), amount: 0.02 },
        ];
        let times = [-0.5, 0.5];
        let v = coupon_value(&coupons, 0.05, |c| {
            if c.date.year() == 2024 { times[0] } else { times[1] }
        });
        assert_relative_eq!(v, 0.02 * (-0.025f64).exp(), epsilon = 1e-12);
    }
}
