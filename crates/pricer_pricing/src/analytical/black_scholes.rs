//! Black-Scholes-Merton model with continuous dividend yield.
//!
//! Prices European calls and puts and returns the full set of analytic
//! Greeks. Theta and charm/color are derivatives with respect to calendar
//! time (per year), so theta is normally negative for long options.

use pricer_core::math::distributions::{norm_cdf, norm_pdf};
use pricer_models::instruments::OptionType;

use super::error::AnalyticalError;

/// Expiries at or below this are treated as expired.
pub const EXPIRY_EPSILON: f64 = 1e-10;

/// Black-Scholes-Merton model parameters.
///
/// # Examples
///
/// ```
/// use pricer_pricing::analytical::BlackScholes;
/// use pricer_models::instruments::OptionType;
///
/// let bs = BlackScholes::new(100.0, 0.05, 0.0, 0.2).unwrap();
/// let call = bs.price(100.0, 1.0, OptionType::Call);
/// assert!((call - 10.4506).abs() < 1e-3);
///
/// let greeks = bs.greeks(100.0, 1.0, OptionType::Call);
/// assert!((greeks.delta - 0.6368).abs() < 1e-3);
/// assert!((greeks.vega - 37.52).abs() < 1e-2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholes {
    spot: f64,
    rate: f64,
    dividend: f64,
    volatility: f64,
}

/// Price and analytic sensitivities of a European option.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalyticGreeks {
    /// Option value.
    pub price: f64,
    /// ∂V/∂S
    pub delta: f64,
    /// ∂²V/∂S²
    pub gamma: f64,
    /// ∂V/∂σ per unit volatility.
    pub vega: f64,
    /// ∂V/∂t per year.
    pub theta: f64,
    /// ∂V/∂r per unit rate.
    pub rho: f64,
    /// ∂²V/∂S∂σ
    pub vanna: f64,
    /// ∂²V/∂σ²
    pub volga: f64,
    /// ∂Δ/∂t per year.
    pub charm: f64,
    /// ∂Γ/∂t per year.
    pub color: f64,
}

impl BlackScholes {
    /// Creates a model, rejecting non-positive spot or volatility.
    pub fn new(
        spot: f64,
        rate: f64,
        dividend: f64,
        volatility: f64,
    ) -> Result<Self, AnalyticalError> {
        if !(spot.is_finite() && spot > 0.0) {
            return Err(AnalyticalError::InvalidSpot { spot });
        }
        if !(volatility.is_finite() && volatility > 0.0) {
            return Err(AnalyticalError::InvalidVolatility { volatility });
        }
        if !rate.is_finite() {
            return Err(AnalyticalError::InvalidRate {
                name: "rate",
                value: rate,
            });
        }
        if !dividend.is_finite() {
            return Err(AnalyticalError::InvalidRate {
                name: "dividend",
                value: dividend,
            });
        }
        Ok(Self {
            spot,
            rate,
            dividend,
            volatility,
        })
    }

    /// Spot price.
    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Risk-free rate.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Dividend yield.
    #[inline]
    pub fn dividend(&self) -> f64 {
        self.dividend
    }

    /// Volatility.
    #[inline]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Same model with a different volatility.
    pub fn with_volatility(&self, volatility: f64) -> Result<Self, AnalyticalError> {
        Self::new(self.spot, self.rate, self.dividend, volatility)
    }

    /// d₁ = [ln(S/K) + (r − q + σ²/2)T] / (σ√T)
    #[inline]
    pub fn d1(&self, strike: f64, expiry: f64) -> f64 {
        let vol_sqrt_t = self.volatility * expiry.sqrt();
        ((self.spot / strike).ln()
            + (self.rate - self.dividend + 0.5 * self.volatility * self.volatility) * expiry)
            / vol_sqrt_t
    }

    /// d₂ = d₁ − σ√T
    #[inline]
    pub fn d2(&self, strike: f64, expiry: f64) -> f64 {
        self.d1(strike, expiry) - self.volatility * expiry.sqrt()
    }

    /// European option value; intrinsic value at or past expiry.
    pub fn price(&self, strike: f64, expiry: f64, option_type: OptionType) -> f64 {
        if expiry <= EXPIRY_EPSILON {
            return option_type.intrinsic(self.spot, strike);
        }
        let d1 = self.d1(strike, expiry);
        let d2 = d1 - self.volatility * expiry.sqrt();
        let fwd = self.spot * (-self.dividend * expiry).exp();
        let df = (-self.rate * expiry).exp();
        match option_type {
            OptionType::Call => fwd * norm_cdf(d1) - strike * df * norm_cdf(d2),
            OptionType::Put => strike * df * norm_cdf(-d2) - fwd * norm_cdf(-d1),
        }
    }

    /// European call value.
    #[inline]
    pub fn price_call(&self, strike: f64, expiry: f64) -> f64 {
        self.price(strike, expiry, OptionType::Call)
    }

    /// European put value.
    #[inline]
    pub fn price_put(&self, strike: f64, expiry: f64) -> f64 {
        self.price(strike, expiry, OptionType::Put)
    }

    /// Cash-or-nothing call paying one unit if `S_T ≥ K`: e^(−rT)·N(d₂).
    pub fn digital_call(&self, strike: f64, expiry: f64) -> f64 {
        if expiry <= EXPIRY_EPSILON {
            return if self.spot >= strike { 1.0 } else { 0.0 };
        }
        (-self.rate * expiry).exp() * norm_cdf(self.d2(strike, expiry))
    }

    /// Price and all analytic Greeks. Greeks are zero at or past expiry.
    pub fn greeks(&self, strike: f64, expiry: f64, option_type: OptionType) -> AnalyticGreeks {
        let price = self.price(strike, expiry, option_type);
        if expiry <= EXPIRY_EPSILON {
            return AnalyticGreeks {
                price,
                ..AnalyticGreeks::default()
            };
        }

        let (s, k, r, q, sigma) = (self.spot, strike, self.rate, self.dividend, self.volatility);
        let sqrt_t = expiry.sqrt();
        let vol_sqrt_t = sigma * sqrt_t;
        let d1 = self.d1(k, expiry);
        let d2 = d1 - vol_sqrt_t;
        let pdf_d1 = norm_pdf(d1);
        let dq = (-q * expiry).exp();
        let df = (-r * expiry).exp();

        let gamma = dq * pdf_d1 / (s * vol_sqrt_t);
        let vega = s * dq * pdf_d1 * sqrt_t;
        let vanna = -dq * pdf_d1 * d2 / sigma;
        let volga = vega * d1 * d2 / sigma;
        let decay = -s * dq * pdf_d1 * sigma / (2.0 * sqrt_t);
        let charm_core = dq * pdf_d1 * (2.0 * (r - q) * expiry - d2 * vol_sqrt_t)
            / (2.0 * expiry * vol_sqrt_t);
        let color = -dq * pdf_d1 / (2.0 * s * expiry * vol_sqrt_t)
            * (2.0 * q * expiry
                + 1.0
                + (2.0 * (r - q) * expiry - d2 * vol_sqrt_t) / vol_sqrt_t * d1);

        let (delta, theta, rho, charm) = match option_type {
            OptionType::Call => (
                dq * norm_cdf(d1),
                decay - r * k * df * norm_cdf(d2) + q * s * dq * norm_cdf(d1),
                k * expiry * df * norm_cdf(d2),
                q * dq * norm_cdf(d1) - charm_core,
            ),
            OptionType::Put => (
                -dq * norm_cdf(-d1),
                decay + r * k * df * norm_cdf(-d2) - q * s * dq * norm_cdf(-d1),
                -k * expiry * df * norm_cdf(-d2),
                -q * dq * norm_cdf(-d1) - charm_core,
            ),
        };

        AnalyticGreeks {
            price,
            delta,
            gamma,
            vega,
            theta,
            rho,
            vanna,
            volga,
            charm,
            color,
        }
    }
}
